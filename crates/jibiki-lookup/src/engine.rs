use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use jibiki_core::search::{ParameterValue, SearchParameter};

use crate::config::LookupConfig;
use crate::error::LookupError;
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;

/// Cooperative cancellation signal, checked between matches. A search
/// carries the generation it was submitted under; bumping the shared
/// counter marks every older search as cancelled.
#[derive(Clone)]
pub struct CancelSignal {
    latest: Arc<AtomicU64>,
    id: u64,
}

impl CancelSignal {
    pub fn new(latest: Arc<AtomicU64>, id: u64) -> Self {
        Self { latest, id }
    }

    /// A signal that never fires, for synchronous foreground lookups.
    pub fn none() -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            id: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.id
    }
}

/// Executes one dictionary lookup to completion, pushing results into
/// the handler. The lookup configuration comes from a [`LookupModel`].
///
/// One misbehaving dictionary never aborts the whole search: open and
/// pull failures become exception events and the remaining dictionaries
/// are still searched. The entry limit bounds entries pulled from the
/// dictionaries, whether or not the filters let them through, so a tight
/// limit bounds the work done even when most matches are filtered out.
pub struct LookupEngine<H> {
    handler: H,
    entry_limit: usize,
}

impl<H: LookupResultHandler> LookupEngine<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            entry_limit: usize::MAX,
        }
    }

    pub fn with_config(handler: H, config: &LookupConfig) -> Self {
        Self {
            handler,
            entry_limit: config.entry_limit.unwrap_or(usize::MAX),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Run one search to completion on the calling thread.
    pub fn do_lookup(&mut self, model: &LookupModel) {
        self.do_lookup_cancellable(model, &CancelSignal::none());
    }

    /// Run one search, unwinding at the next match boundary once
    /// `cancel` fires. The end event is delivered on every exit path.
    pub fn do_lookup_cancellable(&mut self, model: &LookupModel, cancel: &CancelSignal) {
        self.handler.start_lookup_model(model);
        self.run(model, cancel);
        self.handler.end_lookup();
    }

    fn run(&mut self, model: &LookupModel, cancel: &CancelSignal) {
        let parameters = match resolve_parameters(model) {
            Ok(parameters) => parameters,
            Err(error) => {
                tracing::warn!("lookup misconfigured: {error}");
                self.handler.exception(&error);
                return;
            }
        };

        let mode = model.search_mode();
        let limit = self.entry_limit.min(model.entry_limit().unwrap_or(usize::MAX));
        let mut pulled = 0usize;

        for dictionary in model.dictionaries() {
            self.handler.dictionary(dictionary);
            if pulled >= limit {
                break;
            }

            let mut results = match dictionary.search(&mode, &parameters) {
                Ok(results) => results,
                Err(error) => {
                    tracing::warn!("dictionary {} failed to open: {error}", dictionary.name());
                    self.handler.exception(&LookupError::Search(error));
                    continue;
                }
            };

            while pulled < limit {
                // checked before each pull; a pull that blocks inside the
                // dictionary cannot be interrupted from here
                if cancel.is_cancelled() {
                    tracing::debug!("lookup cancelled after {pulled} entries");
                    return;
                }

                let entry = match results.next() {
                    None => break,
                    Some(Ok(entry)) => entry,
                    Some(Err(error)) => {
                        tracing::warn!(
                            "dictionary {} failed mid-iteration: {error}",
                            dictionary.name()
                        );
                        self.handler.exception(&LookupError::Search(error));
                        break;
                    }
                };

                // counted per pull, not per accepted entry
                pulled += 1;
                if model
                    .filters()
                    .iter()
                    .all(|filter| filter.accept(entry.as_ref()))
                {
                    self.handler.dictionary_entry(&entry);
                }
            }
        }
    }
}

fn resolve_parameters(model: &LookupModel) -> Result<Vec<ParameterValue>, LookupError> {
    let mode = model.search_mode();
    mode.parameters()
        .iter()
        .map(|parameter| match parameter {
            SearchParameter::Expression => Ok(ParameterValue::Expression(
                model.search_expression().to_owned(),
            )),
            SearchParameter::SearchFields => Ok(ParameterValue::Fields(model.search_fields())),
            SearchParameter::Distance => Ok(ParameterValue::Distance(model.distance())),
            other => Err(LookupError::UnsupportedParameter {
                mode: mode.id(),
                parameter: *other,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::AttributeFilter;
    use crate::testing::{
        FailingDictionary, FlakyDictionary, RecordingHandler, match_all_model, sample_dictionary,
    };
    use jibiki_core::attribute::{Attribute, AttributeGroup};
    use jibiki_core::memory::{MemoryDictionary, MemoryEntry};
    use jibiki_core::search::SearchMode;

    fn colloquial() -> Attribute {
        Attribute::new("colloquial", vec![AttributeGroup::Word])
    }

    #[test]
    fn streams_matches_in_dictionary_and_match_order() {
        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        let model = match_all_model(vec![sample_dictionary("first"), sample_dictionary("second")]);

        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            [
                "start:Any match \"\"",
                "dictionary:first",
                "entry:first-1",
                "entry:first-2",
                "dictionary:second",
                "entry:second-1",
                "entry:second-2",
                "end",
            ]
        );
    }

    #[test]
    fn limit_counts_pulled_entries_not_accepted_ones() {
        // D1 holds e1 and e2, the filter rejects e2; D2 holds e3.
        // With a limit of two pulls, e2 consumes the second pull and
        // D2's e3 is never reached.
        let d1 = MemoryDictionary::new(
            "d1",
            vec![
                MemoryEntry::new("e1", "一"),
                MemoryEntry::new("e2", "二").with_attribute(AttributeGroup::Word, colloquial()),
            ],
        );
        let d2 = MemoryDictionary::new("d2", vec![MemoryEntry::new("e3", "三")]);

        let mut model = match_all_model(vec![d1, d2]);
        model.add_filter(Arc::new(AttributeFilter::new(
            "no-colloquial",
            "",
            colloquial(),
            false,
        )));
        model.set_entry_limit(Some(2));

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            [
                "start:Any match \"\"",
                "dictionary:d1",
                "entry:e1",
                "dictionary:d2",
                "end",
            ]
        );
    }

    #[test]
    fn repeated_lookup_accepts_the_same_entries() {
        let d = MemoryDictionary::new(
            "repeat",
            vec![
                MemoryEntry::new("e1", "一"),
                MemoryEntry::new("e2", "二").with_attribute(AttributeGroup::Word, colloquial()),
                MemoryEntry::new("e3", "三"),
            ],
        );
        let mut model = match_all_model(vec![d]);
        model.add_filter(Arc::new(AttributeFilter::new(
            "no-colloquial",
            "",
            colloquial(),
            false,
        )));

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);
        engine.do_lookup(&model);

        let events = handler.events();
        let (first, second) = events.split_at(events.len() / 2);
        assert_eq!(first, second);
        assert!(first.contains(&"entry:e1".to_owned()));
        assert!(!first.contains(&"entry:e2".to_owned()));
    }

    #[test]
    fn zero_limit_pulls_nothing() {
        let mut model = match_all_model(vec![sample_dictionary("only")]);
        model.set_entry_limit(Some(0));

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            ["start:Any match \"\"", "dictionary:only", "end"]
        );
    }

    #[test]
    fn engine_config_limit_applies_when_the_model_sets_none() {
        let model = match_all_model(vec![sample_dictionary("only")]);
        let handler = RecordingHandler::new();
        let config = LookupConfig {
            entry_limit: Some(1),
            ..LookupConfig::default()
        };
        let mut engine = LookupEngine::with_config(handler.clone(), &config);
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            ["start:Any match \"\"", "dictionary:only", "entry:only-1", "end"]
        );
    }

    #[test]
    fn open_failure_is_isolated_to_the_dictionary() {
        let broken = Arc::new(FailingDictionary {
            name: "broken".to_owned(),
        });
        let model = match_all_model(vec![broken, sample_dictionary("healthy")]);

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            [
                "start:Any match \"\"",
                "dictionary:broken",
                "exception:search",
                "dictionary:healthy",
                "entry:healthy-1",
                "entry:healthy-2",
                "end",
            ]
        );
    }

    #[test]
    fn open_failure_alone_still_ends_the_stream() {
        let broken = Arc::new(FailingDictionary {
            name: "broken".to_owned(),
        });
        let model = match_all_model(vec![broken]);

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            ["start:Any match \"\"", "dictionary:broken", "exception:search", "end"]
        );
    }

    #[test]
    fn pull_failure_stops_that_dictionary_only() {
        let flaky = Arc::new(FlakyDictionary {
            inner: sample_dictionary("flaky"),
            fail_at: 1,
        });
        let model = match_all_model(vec![flaky, sample_dictionary("after")]);

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            [
                "start:Any match \"\"",
                "dictionary:flaky",
                "entry:flaky-1",
                "exception:search",
                "dictionary:after",
                "entry:after-1",
                "entry:after-2",
                "end",
            ]
        );
    }

    #[test]
    fn unsupported_parameter_fails_the_search_but_ends_the_stream() {
        const WILDCARD_MODE: SearchMode = SearchMode::new(
            "wildcard",
            "Wildcard match",
            "Entries matching a wildcard pattern",
            &[SearchParameter::Expression, SearchParameter::Wildcard],
        );

        let mut model = match_all_model(vec![sample_dictionary("unused")]);
        model.set_search_mode(WILDCARD_MODE);

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        assert_eq!(
            handler.events(),
            ["start:Wildcard match \"\"", "exception:unsupported-parameter", "end"]
        );
    }

    #[test]
    fn already_cancelled_search_ends_without_pulling() {
        let model = match_all_model(vec![sample_dictionary("unread")]);
        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());

        let cancelled = CancelSignal::new(Arc::new(AtomicU64::new(7)), 6);
        engine.do_lookup_cancellable(&model, &cancelled);

        assert_eq!(
            handler.events(),
            ["start:Any match \"\"", "dictionary:unread", "end"]
        );
    }

    #[test]
    fn filters_apply_in_order_and_short_circuit() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingReject {
            calls: Arc<AtomicUsize>,
        }

        impl crate::filter::LookupResultFilter for CountingReject {
            fn name(&self) -> &str {
                "reject-all"
            }

            fn accept(&self, _entry: &dyn jibiki_core::dictionary::DictionaryEntry) -> bool {
                self.calls.fetch_add(1, Ordering::Relaxed);
                false
            }
        }

        let second_calls = Arc::new(AtomicUsize::new(0));
        let mut model = match_all_model(vec![sample_dictionary("filtered")]);
        model.add_filter(Arc::new(CountingReject {
            calls: Arc::new(AtomicUsize::new(0)),
        }));
        model.add_filter(Arc::new(CountingReject {
            calls: second_calls.clone(),
        }));

        let handler = RecordingHandler::new();
        let mut engine = LookupEngine::new(handler.clone());
        engine.do_lookup(&model);

        // the first filter rejects, the second is never consulted
        assert_eq!(second_calls.load(Ordering::Relaxed), 0);
        assert_eq!(
            handler.events(),
            ["start:Any match \"\"", "dictionary:filtered", "end"]
        );
    }
}
