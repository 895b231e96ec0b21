use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use unicode_normalization::UnicodeNormalization;

use crate::attribute::{Attribute, AttributeGroup};
use crate::dictionary::{Dictionary, DictionaryEntry, EntryIter, SearchError};
use crate::search::{ParameterValue, SearchFieldSelection, SearchMode};

/// Entry of a [`MemoryDictionary`].
#[derive(Debug, Clone, Default)]
pub struct MemoryEntry {
    pub id: String,
    pub headword: String,
    /// Alternative spellings of the headword.
    pub alternatives: Vec<String>,
    pub readings: Vec<String>,
    pub translations: Vec<String>,
    pub general_attributes: Vec<Attribute>,
    pub word_attributes: Vec<Attribute>,
    pub reading_attributes: Vec<Attribute>,
    pub translation_attributes: Vec<Attribute>,
    /// One attribute set per spelling alternative.
    pub alternative_attributes: Vec<Vec<Attribute>>,
    /// One attribute set per translation sense.
    pub sense_attributes: Vec<Vec<Attribute>>,
}

impl MemoryEntry {
    pub fn new(id: impl Into<String>, headword: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headword: headword.into(),
            ..Self::default()
        }
    }

    pub fn with_readings(mut self, readings: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.readings = readings.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_translations(
        mut self,
        translations: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.translations = translations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribute(mut self, group: AttributeGroup, attribute: Attribute) -> Self {
        match group {
            AttributeGroup::General => self.general_attributes.push(attribute),
            AttributeGroup::Word => self.word_attributes.push(attribute),
            AttributeGroup::Reading => self.reading_attributes.push(attribute),
            AttributeGroup::Translation => self.translation_attributes.push(attribute),
        }
        self
    }

    fn attributes(&self, group: AttributeGroup) -> &[Attribute] {
        match group {
            AttributeGroup::General => &self.general_attributes,
            AttributeGroup::Word => &self.word_attributes,
            AttributeGroup::Reading => &self.reading_attributes,
            AttributeGroup::Translation => &self.translation_attributes,
        }
    }
}

/// Normalization applied to index keys and search expressions alike.
fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().trim().to_owned()
}

/// Simple in-process dictionary backend. Exact searches go through
/// normalized headword/reading indexes; the other expression modes scan
/// the entry table. Near matches are not supported.
pub struct MemoryDictionary {
    name: String,
    entries: Vec<Arc<MemoryEntry>>,
    headword_index: HashMap<String, Vec<usize>>,
    reading_index: HashMap<String, Vec<usize>>,
    supported_attributes: HashSet<Attribute>,
    self_ref: Weak<MemoryDictionary>,
}

impl MemoryDictionary {
    pub fn new(name: impl Into<String>, entries: Vec<MemoryEntry>) -> Arc<Self> {
        let name = name.into();
        let mut headword_index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut reading_index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut supported_attributes = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            headword_index
                .entry(normalize(&entry.headword))
                .or_default()
                .push(index);
            for alternative in &entry.alternatives {
                headword_index
                    .entry(normalize(alternative))
                    .or_default()
                    .push(index);
            }
            for reading in &entry.readings {
                reading_index
                    .entry(normalize(reading))
                    .or_default()
                    .push(index);
            }

            for group in AttributeGroup::ALL {
                supported_attributes.extend(entry.attributes(group).iter().cloned());
            }
            for set in entry
                .alternative_attributes
                .iter()
                .chain(entry.sense_attributes.iter())
            {
                supported_attributes.extend(set.iter().cloned());
            }
        }

        tracing::debug!(
            "dictionary {}: {} entries, {} attributes",
            name,
            entries.len(),
            supported_attributes.len()
        );

        Arc::new_cyclic(|self_ref| Self {
            name,
            entries: entries.into_iter().map(Arc::new).collect(),
            headword_index,
            reading_index,
            supported_attributes,
            self_ref: self_ref.clone(),
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn strong(&self) -> Arc<dyn Dictionary> {
        // a live &self implies at least one strong reference
        self.self_ref
            .upgrade()
            .expect("self reference valid while the dictionary is alive")
    }

    fn handle(&self, index: usize, dictionary: &Arc<dyn Dictionary>) -> Arc<dyn DictionaryEntry> {
        Arc::new(EntryHandle {
            data: self.entries[index].clone(),
            dictionary: dictionary.clone(),
        })
    }

    fn exact_indices(&self, expression: &str, fields: SearchFieldSelection) -> Vec<usize> {
        let mut indices = Vec::new();
        if fields.word {
            if let Some(hits) = self.headword_index.get(expression) {
                indices.extend(hits);
            }
        }
        if fields.reading {
            if let Some(hits) = self.reading_index.get(expression) {
                indices.extend(hits);
            }
        }
        if fields.translation {
            for (index, entry) in self.entries.iter().enumerate() {
                if entry.translations.iter().any(|t| normalize(t) == expression) {
                    indices.push(index);
                }
            }
        }
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    fn scan_indices(
        &self,
        mode: &SearchMode,
        expression: &str,
        fields: SearchFieldSelection,
    ) -> Vec<usize> {
        let matches = |candidate: &str| {
            let candidate = normalize(candidate);
            match mode.id() {
                "prefix" => candidate.starts_with(expression),
                "suffix" => candidate.ends_with(expression),
                _ => candidate.contains(expression),
            }
        };

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                (fields.word
                    && (matches(&entry.headword) || entry.alternatives.iter().any(|a| matches(a))))
                    || (fields.reading && entry.readings.iter().any(|r| matches(r)))
                    || (fields.translation && entry.translations.iter().any(|t| matches(t)))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

impl Dictionary for MemoryDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, mode: &SearchMode) -> bool {
        [
            SearchMode::EXACT,
            SearchMode::PREFIX,
            SearchMode::SUFFIX,
            SearchMode::ANY,
        ]
        .contains(mode)
    }

    fn supports_attribute(&self, attribute: &Attribute) -> bool {
        self.supported_attributes.contains(attribute)
    }

    fn search(
        &self,
        mode: &SearchMode,
        parameters: &[ParameterValue],
    ) -> Result<EntryIter<'_>, SearchError> {
        if !self.supports(mode) {
            return Err(SearchError::UnsupportedSearchMode {
                dictionary: self.name.clone(),
                mode: mode.id(),
            });
        }

        let mut expression = None;
        let mut fields = SearchFieldSelection::default();
        for parameter in parameters {
            match parameter {
                ParameterValue::Expression(text) => expression = Some(normalize(text)),
                ParameterValue::Fields(selection) => fields = *selection,
                ParameterValue::Distance(_) => {}
            }
        }
        let expression = expression.ok_or_else(|| SearchError::UnsupportedParameters {
            dictionary: self.name.clone(),
            mode: mode.id(),
        })?;

        let indices = if *mode == SearchMode::EXACT {
            self.exact_indices(&expression, fields)
        } else {
            self.scan_indices(mode, &expression, fields)
        };

        let dictionary = self.strong();
        let entries: Vec<_> = indices
            .into_iter()
            .map(|index| Ok(self.handle(index, &dictionary)))
            .collect();
        Ok(Box::new(entries.into_iter()))
    }

    fn get_by_id(&self, id: &str) -> Option<Arc<dyn DictionaryEntry>> {
        let dictionary = self.strong();
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .map(|index| self.handle(index, &dictionary))
    }
}

struct EntryHandle {
    data: Arc<MemoryEntry>,
    dictionary: Arc<dyn Dictionary>,
}

impl DictionaryEntry for EntryHandle {
    fn id(&self) -> String {
        self.data.id.clone()
    }

    fn dictionary(&self) -> Arc<dyn Dictionary> {
        self.dictionary.clone()
    }

    fn headword(&self) -> String {
        self.data.headword.clone()
    }

    fn alternatives(&self) -> Vec<String> {
        self.data.alternatives.clone()
    }

    fn readings(&self) -> Vec<String> {
        self.data.readings.clone()
    }

    fn translations(&self) -> Vec<String> {
        self.data.translations.clone()
    }

    fn attributes(&self, group: AttributeGroup) -> Vec<Attribute> {
        self.data.attributes(group).to_vec()
    }

    fn alternative_attributes(&self, group: AttributeGroup) -> Vec<Vec<Attribute>> {
        match group {
            AttributeGroup::Word => self.data.alternative_attributes.clone(),
            AttributeGroup::Translation => self.data.sense_attributes.clone(),
            _ => Vec::new(),
        }
    }
}
