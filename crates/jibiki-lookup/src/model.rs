use std::sync::Arc;

use jibiki_core::dictionary::Dictionary;
use jibiki_core::search::{SearchFieldSelection, SearchMode};

use crate::filter::LookupResultFilter;

/// User configuration of one dictionary lookup: the search mode, its
/// parameter values, and the ordered dictionary and filter selections.
///
/// The model is a plain data holder. It is mutated by the caller between
/// searches only; the background engine works on a snapshot taken at
/// submission time.
#[derive(Clone)]
pub struct LookupModel {
    search_mode: SearchMode,
    search_expression: String,
    search_fields: SearchFieldSelection,
    distance: u32,
    dictionaries: Vec<Arc<dyn Dictionary>>,
    filters: Vec<Arc<dyn LookupResultFilter>>,
    entry_limit: Option<usize>,
}

impl LookupModel {
    pub fn new(search_mode: SearchMode) -> Self {
        Self {
            search_mode,
            search_expression: String::new(),
            search_fields: SearchFieldSelection::default(),
            distance: 1,
            dictionaries: Vec::new(),
            filters: Vec::new(),
            entry_limit: None,
        }
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        self.search_mode = mode;
    }

    pub fn search_expression(&self) -> &str {
        &self.search_expression
    }

    pub fn set_search_expression(&mut self, expression: impl Into<String>) {
        self.search_expression = expression.into();
    }

    pub fn search_fields(&self) -> SearchFieldSelection {
        self.search_fields
    }

    pub fn set_search_fields(&mut self, fields: SearchFieldSelection) {
        self.search_fields = fields;
    }

    pub fn distance(&self) -> u32 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: u32) {
        self.distance = distance;
    }

    /// Selected dictionaries, searched in this order.
    pub fn dictionaries(&self) -> &[Arc<dyn Dictionary>] {
        &self.dictionaries
    }

    pub fn add_dictionary(&mut self, dictionary: Arc<dyn Dictionary>) {
        self.dictionaries.push(dictionary);
    }

    /// Selected result filters, applied in this order.
    pub fn filters(&self) -> &[Arc<dyn LookupResultFilter>] {
        &self.filters
    }

    pub fn add_filter(&mut self, filter: Arc<dyn LookupResultFilter>) {
        self.filters.push(filter);
    }

    /// Per-search bound on examined entries, `None` for unbounded.
    pub fn entry_limit(&self) -> Option<usize> {
        self.entry_limit
    }

    pub fn set_entry_limit(&mut self, limit: Option<usize>) {
        self.entry_limit = limit;
    }

    /// Short human-readable summary for sinks that do not understand the
    /// model itself.
    pub fn description(&self) -> String {
        format!("{} \"{}\"", self.search_mode.name(), self.search_expression)
    }
}

impl std::fmt::Debug for LookupModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupModel")
            .field("search_mode", &self.search_mode.id())
            .field("search_expression", &self.search_expression)
            .field("search_fields", &self.search_fields)
            .field("distance", &self.distance)
            .field(
                "dictionaries",
                &self
                    .dictionaries
                    .iter()
                    .map(|d| d.name().to_owned())
                    .collect::<Vec<_>>(),
            )
            .field(
                "filters",
                &self
                    .filters
                    .iter()
                    .map(|f| f.name().to_owned())
                    .collect::<Vec<_>>(),
            )
            .field("entry_limit", &self.entry_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_dictionary;

    #[test]
    fn dictionaries_keep_selection_order() {
        let mut model = LookupModel::new(SearchMode::EXACT);
        model.add_dictionary(sample_dictionary("first"));
        model.add_dictionary(sample_dictionary("second"));
        let names: Vec<_> = model.dictionaries().iter().map(|d| d.name().to_owned()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn description_names_mode_and_expression() {
        let mut model = LookupModel::new(SearchMode::PREFIX);
        model.set_search_expression("食");
        assert_eq!(model.description(), "Starts with \"食\"");
    }
}
