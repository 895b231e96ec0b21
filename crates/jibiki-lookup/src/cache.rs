use std::sync::Arc;

use jibiki_core::dictionary::{Dictionary, DictionaryEntry, EntryIter, EntryReference};

use crate::error::LookupError;
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;
use crate::proxy::{HandlerId, LookupResultProxy};

enum CachedStart {
    Description(String),
    Model(LookupModel),
}

enum CachedEvent {
    Dictionary(Arc<dyn Dictionary>),
    Entry(EntryReference),
    Error(LookupError),
    Note(String),
}

/// Result handler that records one search into an ordered event log and
/// can replay it any number of times without touching the dictionaries
/// again. Entries are kept as [`EntryReference`]s and resolved lazily on
/// replay, so caching a large result set does not retain the entries
/// themselves.
///
/// Handlers registered on the cache receive the live events unchanged
/// while the search is being recorded.
#[derive(Default)]
pub struct LookupResultCache {
    start: Option<CachedStart>,
    events: Vec<CachedEvent>,
    downstream: LookupResultProxy,
}

impl LookupResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: Box<dyn LookupResultHandler>) -> Self {
        let mut cache = Self::new();
        cache.add_handler(handler);
        cache
    }

    /// Seed the cache directly from a result iterator instead of a live
    /// search. Pull failures are recorded as exception events, exactly
    /// as a live search would have delivered them.
    pub fn from_entries(description: impl Into<String>, entries: EntryIter<'_>) -> Self {
        let mut cache = Self::new();
        cache.start = Some(CachedStart::Description(description.into()));
        for item in entries {
            match item {
                Ok(entry) => cache.events.push(CachedEvent::Entry(entry.reference())),
                Err(error) => cache.events.push(CachedEvent::Error(error.into())),
            }
        }
        cache
    }

    /// Register a downstream handler for live events.
    pub fn add_handler(&mut self, handler: Box<dyn LookupResultHandler>) -> HandlerId {
        self.downstream.add_handler(handler)
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> Option<Box<dyn LookupResultHandler>> {
        self.downstream.remove_handler(id)
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.events.clear();
    }

    /// True until a search has been recorded.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// Number of recorded events after the start record.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Re-emit the recorded event sequence to `handler`, ending with
    /// exactly one end event. References that no longer resolve are
    /// delivered as exception events in their recorded position.
    pub fn replay(&self, handler: &mut dyn LookupResultHandler) -> Result<(), LookupError> {
        let start = self.start.as_ref().ok_or(LookupError::EmptyCache)?;
        match start {
            CachedStart::Description(description) => handler.start_lookup(description),
            CachedStart::Model(model) => handler.start_lookup_model(model),
        }

        for event in &self.events {
            match event {
                CachedEvent::Dictionary(dictionary) => handler.dictionary(dictionary),
                CachedEvent::Entry(reference) => match reference.resolve() {
                    Ok(entry) => handler.dictionary_entry(&entry),
                    Err(error) => handler.exception(&LookupError::Search(error)),
                },
                CachedEvent::Error(error) => handler.exception(error),
                CachedEvent::Note(note) => handler.note(note),
            }
        }

        handler.end_lookup();
        Ok(())
    }
}

impl LookupResultHandler for LookupResultCache {
    fn start_lookup(&mut self, description: &str) {
        self.clear();
        self.start = Some(CachedStart::Description(description.to_owned()));
        self.downstream.start_lookup(description);
    }

    fn start_lookup_model(&mut self, model: &LookupModel) {
        self.clear();
        self.start = Some(CachedStart::Model(model.clone()));
        self.downstream.start_lookup_model(model);
    }

    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>) {
        self.events.push(CachedEvent::Dictionary(dictionary.clone()));
        self.downstream.dictionary(dictionary);
    }

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>) {
        self.events.push(CachedEvent::Entry(entry.reference()));
        self.downstream.dictionary_entry(entry);
    }

    fn exception(&mut self, error: &LookupError) {
        self.events.push(CachedEvent::Error(error.clone()));
        self.downstream.exception(error);
    }

    fn note(&mut self, note: &str) {
        self.events.push(CachedEvent::Note(note.to_owned()));
        self.downstream.note(note);
    }

    fn end_lookup(&mut self) {
        self.downstream.end_lookup();
    }
}
