use std::sync::Arc;

use crate::attribute::{Attribute, AttributeGroup};
use crate::search::{ParameterValue, SearchMode};

/// Errors raised by dictionary backends. Clone so that a recorded error
/// can be replayed from a result cache and forwarded over channels.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("dictionary {dictionary} does not support search mode {mode}")]
    UnsupportedSearchMode { dictionary: String, mode: &'static str },

    #[error("dictionary {dictionary} was given invalid parameters for {mode}")]
    UnsupportedParameters { dictionary: String, mode: &'static str },

    #[error("entry {id} not found in dictionary {dictionary}")]
    EntryNotFound { dictionary: String, id: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Backend(String),
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Io(err.to_string())
    }
}

/// Iterator over search matches. Pulling a match may fail independently
/// of the others, so each item carries its own result.
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<Arc<dyn DictionaryEntry>, SearchError>> + Send + 'a>;

/// Generic interface to a dictionary with an arbitrary backend.
/// Dictionaries are shared read-only; concurrent searches over the same
/// dictionary must be possible even though a single result iterator
/// itself need not be thread-safe.
pub trait Dictionary: Send + Sync {
    /// Short descriptive name, e.g. the backing file name.
    fn name(&self) -> &str;

    /// Whether searches with the given mode can be executed at all.
    fn supports(&self, mode: &SearchMode) -> bool;

    /// Whether entries of this dictionary may carry the attribute.
    fn supports_attribute(&self, attribute: &Attribute) -> bool;

    /// Open a match iterator for the given mode. The parameters are the
    /// mode's declared schema, resolved in declaration order.
    fn search(&self, mode: &SearchMode, parameters: &[ParameterValue])
    -> Result<EntryIter<'_>, SearchError>;

    /// Re-fetch an entry by its id, if the backend still has it.
    fn get_by_id(&self, id: &str) -> Option<Arc<dyn DictionaryEntry>>;
}

/// One dictionary match.
pub trait DictionaryEntry: Send + Sync {
    /// Id unique within the owning dictionary, stable across searches.
    fn id(&self) -> String;

    /// The dictionary this entry came from.
    fn dictionary(&self) -> Arc<dyn Dictionary>;

    /// Main headword.
    fn headword(&self) -> String;

    /// Alternative spellings of the headword.
    fn alternatives(&self) -> Vec<String> {
        Vec::new()
    }

    fn readings(&self) -> Vec<String>;

    fn translations(&self) -> Vec<String>;

    /// Attributes attached directly to the given group.
    fn attributes(&self, group: AttributeGroup) -> Vec<Attribute>;

    /// Attribute sets of the group's sub-positions: one set per spelling
    /// alternative for `Word`, one per translation sense for
    /// `Translation`. Empty where a group has no sub-positions.
    fn alternative_attributes(&self, group: AttributeGroup) -> Vec<Vec<Attribute>> {
        let _ = group;
        Vec::new()
    }

    /// Backend-specific data as JSON.
    fn metadata(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Lightweight handle to this entry, cheap to retain and resolvable
    /// back into the full entry on demand.
    fn reference(&self) -> EntryReference {
        EntryReference::new(self.dictionary(), self.id())
    }
}

/// Handle to a dictionary entry that does not keep the entry itself
/// alive. Resolution goes back through the owning dictionary.
#[derive(Clone)]
pub struct EntryReference {
    dictionary: Arc<dyn Dictionary>,
    id: String,
}

impl EntryReference {
    pub fn new(dictionary: Arc<dyn Dictionary>, id: String) -> Self {
        Self { dictionary, id }
    }

    pub fn dictionary(&self) -> &Arc<dyn Dictionary> {
        &self.dictionary
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resolve(&self) -> Result<Arc<dyn DictionaryEntry>, SearchError> {
        self.dictionary
            .get_by_id(&self.id)
            .ok_or_else(|| SearchError::EntryNotFound {
                dictionary: self.dictionary.name().to_owned(),
                id: self.id.clone(),
            })
    }
}

impl std::fmt::Debug for EntryReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryReference")
            .field("dictionary", &self.dictionary.name())
            .field("id", &self.id)
            .finish()
    }
}
