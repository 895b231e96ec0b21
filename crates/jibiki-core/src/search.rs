/// Parameter kinds a search mode may declare. The lookup engine resolves
/// each kind from the lookup model; a kind it cannot resolve aborts the
/// search with an unsupported-parameter error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchParameter {
    /// Search expression string.
    Expression,
    /// Which entry fields to match against.
    SearchFields,
    /// Edit distance for near matches.
    Distance,
    /// Wildcard character for pattern searches. Declared by no built-in
    /// mode; dictionaries defining custom modes may require it.
    Wildcard,
}

/// A parameter value resolved from the lookup model, in the order the
/// search mode declared it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Expression(String),
    Fields(SearchFieldSelection),
    Distance(u32),
}

/// Entry fields a search examines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFieldSelection {
    pub word: bool,
    pub reading: bool,
    pub translation: bool,
}

impl Default for SearchFieldSelection {
    fn default() -> Self {
        Self {
            word: true,
            reading: true,
            translation: true,
        }
    }
}

/// A named search strategy together with the ordered list of parameters
/// it needs. The same mode values are shared by all dictionary
/// implementations; how a dictionary executes a mode is up to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchMode {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    parameters: &'static [SearchParameter],
}

const EXPRESSION_PARAMETERS: &[SearchParameter] =
    &[SearchParameter::Expression, SearchParameter::SearchFields];

const DISTANCE_PARAMETERS: &[SearchParameter] = &[
    SearchParameter::Expression,
    SearchParameter::SearchFields,
    SearchParameter::Distance,
];

impl SearchMode {
    /// Define a search mode. Dictionaries offering non-standard search
    /// strategies declare their own modes through this.
    pub const fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        parameters: &'static [SearchParameter],
    ) -> Self {
        Self {
            id,
            name,
            description,
            parameters,
        }
    }

    pub const EXACT: SearchMode = SearchMode {
        id: "exact",
        name: "Exact match",
        description: "Entries matching the expression exactly",
        parameters: EXPRESSION_PARAMETERS,
    };

    pub const PREFIX: SearchMode = SearchMode {
        id: "prefix",
        name: "Starts with",
        description: "Entries beginning with the expression",
        parameters: EXPRESSION_PARAMETERS,
    };

    pub const SUFFIX: SearchMode = SearchMode {
        id: "suffix",
        name: "Ends with",
        description: "Entries ending with the expression",
        parameters: EXPRESSION_PARAMETERS,
    };

    pub const ANY: SearchMode = SearchMode {
        id: "any",
        name: "Any match",
        description: "Entries containing the expression",
        parameters: EXPRESSION_PARAMETERS,
    };

    pub const NEAR: SearchMode = SearchMode {
        id: "near",
        name: "Near match",
        description: "Entries within an edit distance of the expression",
        parameters: DISTANCE_PARAMETERS,
    };

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Ordered parameter schema of this mode.
    pub fn parameters(&self) -> &'static [SearchParameter] {
        self.parameters
    }
}
