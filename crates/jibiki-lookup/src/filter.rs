use jibiki_core::attribute::{Attribute, AttributeGroup};
use jibiki_core::dictionary::{Dictionary, DictionaryEntry};

/// Post-hoc predicate over dictionary entries. Filters are applied in
/// selection order and short-circuit on the first rejection.
pub trait LookupResultFilter: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn accept(&self, entry: &dyn DictionaryEntry) -> bool;

    /// Whether this filter is meaningful for the given dictionary.
    /// Entries of a dictionary it is not enabled for must pass
    /// unconditionally, so a filter never hides results a source cannot
    /// even express.
    fn enable_for(&self, dictionary: &dyn Dictionary) -> bool {
        let _ = dictionary;
        true
    }
}

/// Accepts or rejects entries on the presence of one attribute anywhere
/// in the entry: in any group it applies to, directly or in a
/// sub-position (spelling alternatives, translation senses).
pub struct AttributeFilter {
    name: String,
    description: String,
    attribute: Attribute,
    accept_if_present: bool,
}

impl AttributeFilter {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        attribute: Attribute,
        accept_if_present: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attribute,
            accept_if_present,
        }
    }

    fn present(&self, entry: &dyn DictionaryEntry) -> bool {
        for group in AttributeGroup::ALL {
            if !self.attribute.applies_to(group) {
                continue;
            }
            if entry.attributes(group).contains(&self.attribute) {
                return true;
            }
            if entry
                .alternative_attributes(group)
                .iter()
                .any(|set| set.contains(&self.attribute))
            {
                return true;
            }
        }
        false
    }
}

impl LookupResultFilter for AttributeFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn accept(&self, entry: &dyn DictionaryEntry) -> bool {
        if !self.enable_for(entry.dictionary().as_ref()) {
            return true;
        }
        self.present(entry) == self.accept_if_present
    }

    fn enable_for(&self, dictionary: &dyn Dictionary) -> bool {
        dictionary.supports_attribute(&self.attribute)
    }
}
