use serde::{Deserialize, Serialize};

fn default_dispose_timeout_ms() -> u64 {
    3000
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct LookupConfig {
    /// Upper bound on entries pulled per search, `None` for unbounded.
    /// The limit counts entries examined, not entries that survive the
    /// result filters.
    pub entry_limit: Option<usize>,
    /// How long `dispose` waits for the worker thread to exit.
    #[serde(default = "default_dispose_timeout_ms")]
    pub dispose_timeout_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            entry_limit: None,
            dispose_timeout_ms: default_dispose_timeout_ms(),
        }
    }
}
