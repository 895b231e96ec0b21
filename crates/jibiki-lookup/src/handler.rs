use std::sync::Arc;

use jibiki_core::dictionary::{Dictionary, DictionaryEntry};

use crate::error::LookupError;
use crate::model::LookupModel;

/// Consumer of one search's result stream.
///
/// Every search delivers exactly one start event, then any number of
/// `dictionary`/`dictionary_entry`/`exception`/`note` events, terminated
/// by exactly one `end_lookup`. The end event arrives even when the
/// search failed or was cancelled. The two start methods serve sinks
/// that want the full model and sinks that only need a display string.
///
/// Handlers are called on the engine's worker thread. An implementation
/// that needs its own execution context must marshal the events itself
/// (see [`crate::bridge::ChannelResultHandler`]) and must not block for
/// long: a stalled handler stalls cancellation.
pub trait LookupResultHandler: Send {
    fn start_lookup(&mut self, description: &str);

    fn start_lookup_model(&mut self, model: &LookupModel);

    /// The following entry events belong to this dictionary.
    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>);

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>);

    fn exception(&mut self, error: &LookupError);

    fn note(&mut self, note: &str);

    fn end_lookup(&mut self);
}

impl<H: LookupResultHandler + ?Sized> LookupResultHandler for Box<H> {
    fn start_lookup(&mut self, description: &str) {
        (**self).start_lookup(description);
    }

    fn start_lookup_model(&mut self, model: &LookupModel) {
        (**self).start_lookup_model(model);
    }

    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>) {
        (**self).dictionary(dictionary);
    }

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>) {
        (**self).dictionary_entry(entry);
    }

    fn exception(&mut self, error: &LookupError) {
        (**self).exception(error);
    }

    fn note(&mut self, note: &str) {
        (**self).note(note);
    }

    fn end_lookup(&mut self) {
        (**self).end_lookup();
    }
}
