use jibiki_core::dictionary::SearchError;
use jibiki_core::search::SearchParameter;

/// Failures of the lookup engine subsystem. Per-dictionary and per-entry
/// failures travel the result stream as `exception` events; only
/// configuration-level and cache-state failures surface at the call
/// site.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    /// The selected search mode declares a parameter the engine does not
    /// know how to supply. Fatal to that search; the stream still
    /// terminates with its end event.
    #[error("search mode {mode} requires parameter {parameter:?}, which the lookup engine cannot supply")]
    UnsupportedParameter {
        mode: &'static str,
        parameter: SearchParameter,
    },

    /// A dictionary failed to open or continue a result iterator.
    /// Isolated to that dictionary; the search carries on.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Replay was requested on a cache with no recorded search.
    #[error("result cache is empty")]
    EmptyCache,
}
