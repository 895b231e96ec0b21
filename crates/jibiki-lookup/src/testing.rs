//! Shared fixtures for the in-file test modules.

use std::sync::{Arc, Mutex};

use jibiki_core::dictionary::{Dictionary, DictionaryEntry, EntryIter, SearchError};
use jibiki_core::memory::{MemoryDictionary, MemoryEntry};
use jibiki_core::search::{ParameterValue, SearchMode};

use crate::error::LookupError;
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;

/// Records the event stream as one label per event, shareable across
/// threads through its inner Arc.
#[derive(Clone, Default)]
pub(crate) struct RecordingHandler {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

pub(crate) fn error_label(error: &LookupError) -> &'static str {
    match error {
        LookupError::UnsupportedParameter { .. } => "unsupported-parameter",
        LookupError::Search(_) => "search",
        LookupError::EmptyCache => "empty-cache",
    }
}

impl LookupResultHandler for RecordingHandler {
    fn start_lookup(&mut self, description: &str) {
        self.push(format!("start:{description}"));
    }

    fn start_lookup_model(&mut self, model: &LookupModel) {
        self.push(format!("start:{}", model.description()));
    }

    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>) {
        self.push(format!("dictionary:{}", dictionary.name()));
    }

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>) {
        self.push(format!("entry:{}", entry.id()));
    }

    fn exception(&mut self, error: &LookupError) {
        self.push(format!("exception:{}", error_label(error)));
    }

    fn note(&mut self, note: &str) {
        self.push(format!("note:{note}"));
    }

    fn end_lookup(&mut self) {
        self.push("end".to_owned());
    }
}

/// Two plain entries; ids are prefixed with the dictionary name so
/// streams over several dictionaries stay readable.
pub(crate) fn sample_dictionary(name: &str) -> Arc<MemoryDictionary> {
    MemoryDictionary::new(
        name,
        vec![
            MemoryEntry::new(format!("{name}-1"), "言葉")
                .with_readings(["ことば"])
                .with_translations(["word", "language"]),
            MemoryEntry::new(format!("{name}-2"), "辞書")
                .with_readings(["じしょ"])
                .with_translations(["dictionary"]),
        ],
    )
}

/// Model that matches every entry of the given dictionaries: an
/// any-match search for the empty expression.
pub(crate) fn match_all_model(dictionaries: Vec<Arc<dyn Dictionary>>) -> LookupModel {
    let mut model = LookupModel::new(SearchMode::ANY);
    for dictionary in dictionaries {
        model.add_dictionary(dictionary);
    }
    model
}

/// Dictionary whose search never opens.
pub(crate) struct FailingDictionary {
    pub name: String,
}

impl Dictionary for FailingDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _mode: &SearchMode) -> bool {
        true
    }

    fn supports_attribute(&self, _attribute: &jibiki_core::attribute::Attribute) -> bool {
        false
    }

    fn search(
        &self,
        _mode: &SearchMode,
        _parameters: &[ParameterValue],
    ) -> Result<EntryIter<'_>, SearchError> {
        Err(SearchError::Backend(format!("{} is offline", self.name)))
    }

    fn get_by_id(&self, _id: &str) -> Option<Arc<dyn DictionaryEntry>> {
        None
    }
}

/// Delegates to an inner dictionary but fails the pull at `fail_at`
/// (0-based match index); later matches stay in the iterator to prove
/// the engine abandons them.
pub(crate) struct FlakyDictionary {
    pub inner: Arc<MemoryDictionary>,
    pub fail_at: usize,
}

impl Dictionary for FlakyDictionary {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, mode: &SearchMode) -> bool {
        self.inner.supports(mode)
    }

    fn supports_attribute(&self, attribute: &jibiki_core::attribute::Attribute) -> bool {
        self.inner.supports_attribute(attribute)
    }

    fn search(
        &self,
        mode: &SearchMode,
        parameters: &[ParameterValue],
    ) -> Result<EntryIter<'_>, SearchError> {
        let name = self.inner.name().to_owned();
        let fail_at = self.fail_at;
        let items: Vec<_> = self.inner.search(mode, parameters)?.collect();
        Ok(Box::new(items.into_iter().enumerate().map(
            move |(index, item)| {
                if index == fail_at {
                    Err(SearchError::Backend(format!("{name} dropped the result")))
                } else {
                    item
                }
            },
        )))
    }

    fn get_by_id(&self, id: &str) -> Option<Arc<dyn DictionaryEntry>> {
        self.inner.get_by_id(id)
    }
}
