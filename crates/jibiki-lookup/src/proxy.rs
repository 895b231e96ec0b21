use std::sync::Arc;

use jibiki_core::dictionary::{Dictionary, DictionaryEntry};

use crate::error::LookupError;
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;

/// Key of a handler registered on a [`LookupResultProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Forwards every result event to an ordered list of downstream
/// handlers. Adding or removing handlers while a lookup is in progress
/// is not supported; the stream such a handler observes is undefined.
#[derive(Default)]
pub struct LookupResultProxy {
    handlers: Vec<(HandlerId, Box<dyn LookupResultHandler>)>,
    next_id: u64,
}

impl LookupResultProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: Box<dyn LookupResultHandler>) -> Self {
        let mut proxy = Self::new();
        proxy.add_handler(handler);
        proxy
    }

    pub fn add_handler(&mut self, handler: Box<dyn LookupResultHandler>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> Option<Box<dyn LookupResultHandler>> {
        let index = self.handlers.iter().position(|(key, _)| *key == id)?;
        Some(self.handlers.remove(index).1)
    }

    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl LookupResultHandler for LookupResultProxy {
    fn start_lookup(&mut self, description: &str) {
        for (_, handler) in &mut self.handlers {
            handler.start_lookup(description);
        }
    }

    fn start_lookup_model(&mut self, model: &LookupModel) {
        for (_, handler) in &mut self.handlers {
            handler.start_lookup_model(model);
        }
    }

    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>) {
        for (_, handler) in &mut self.handlers {
            handler.dictionary(dictionary);
        }
    }

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>) {
        for (_, handler) in &mut self.handlers {
            handler.dictionary_entry(entry);
        }
    }

    fn exception(&mut self, error: &LookupError) {
        for (_, handler) in &mut self.handlers {
            handler.exception(error);
        }
    }

    fn note(&mut self, note: &str) {
        for (_, handler) in &mut self.handlers {
            handler.note(note);
        }
    }

    fn end_lookup(&mut self) {
        for (_, handler) in &mut self.handlers {
            handler.end_lookup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHandler;

    #[test]
    fn forwards_to_all_handlers_in_order() {
        let first = RecordingHandler::new();
        let second = RecordingHandler::new();
        let mut proxy = LookupResultProxy::new();
        proxy.add_handler(Box::new(first.clone()));
        proxy.add_handler(Box::new(second.clone()));

        proxy.start_lookup("lookup");
        proxy.note("checking");
        proxy.end_lookup();

        let expected = ["start:lookup", "note:checking", "end"];
        assert_eq!(first.events(), expected);
        assert_eq!(second.events(), expected);
    }

    #[test]
    fn removed_handler_no_longer_receives_events() {
        let kept = RecordingHandler::new();
        let removed = RecordingHandler::new();
        let mut proxy = LookupResultProxy::new();
        proxy.add_handler(Box::new(kept.clone()));
        let id = proxy.add_handler(Box::new(removed.clone()));

        proxy.start_lookup("lookup");
        assert!(proxy.remove_handler(id).is_some());
        proxy.end_lookup();

        assert_eq!(kept.events(), ["start:lookup", "end"]);
        assert_eq!(removed.events(), ["start:lookup"]);
        assert_eq!(proxy.len(), 1);
    }
}
