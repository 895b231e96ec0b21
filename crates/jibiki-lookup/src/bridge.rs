use std::fmt;
use std::sync::Arc;

use jibiki_core::dictionary::{Dictionary, DictionaryEntry};

use crate::error::LookupError;
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;

/// Owned mirror of one result-handler call, suitable for sending across
/// threads.
#[derive(Clone)]
pub enum LookupEvent {
    Start(String),
    StartModel(LookupModel),
    Dictionary(Arc<dyn Dictionary>),
    Entry(Arc<dyn DictionaryEntry>),
    Exception(LookupError),
    Note(String),
    End,
}

impl fmt::Debug for LookupEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupEvent::Start(description) => write!(f, "Start({description})"),
            LookupEvent::StartModel(model) => write!(f, "StartModel({})", model.description()),
            LookupEvent::Dictionary(dictionary) => write!(f, "Dictionary({})", dictionary.name()),
            LookupEvent::Entry(entry) => write!(f, "Entry({})", entry.id()),
            LookupEvent::Exception(error) => write!(f, "Exception({error})"),
            LookupEvent::Note(note) => write!(f, "Note({note})"),
            LookupEvent::End => write!(f, "End"),
        }
    }
}

/// Handler that marshals the result stream to another execution context
/// over a channel instead of processing it on the worker thread. The
/// channel is unbounded so a slow consumer can never stall the search or
/// its cancellation; a consumer on an async runtime can take the
/// receiver async with [`kanal::Receiver::to_async`].
pub struct ChannelResultHandler {
    events_tx: kanal::Sender<LookupEvent>,
}

impl ChannelResultHandler {
    pub fn new() -> (Self, kanal::Receiver<LookupEvent>) {
        let (events_tx, events_rx) = kanal::unbounded();
        (Self { events_tx }, events_rx)
    }

    fn forward(&self, event: LookupEvent) {
        if self.events_tx.send(event).is_err() {
            tracing::debug!("lookup event receiver dropped");
        }
    }
}

impl LookupResultHandler for ChannelResultHandler {
    fn start_lookup(&mut self, description: &str) {
        self.forward(LookupEvent::Start(description.to_owned()));
    }

    fn start_lookup_model(&mut self, model: &LookupModel) {
        self.forward(LookupEvent::StartModel(model.clone()));
    }

    fn dictionary(&mut self, dictionary: &Arc<dyn Dictionary>) {
        self.forward(LookupEvent::Dictionary(dictionary.clone()));
    }

    fn dictionary_entry(&mut self, entry: &Arc<dyn DictionaryEntry>) {
        self.forward(LookupEvent::Entry(entry.clone()));
    }

    fn exception(&mut self, error: &LookupError) {
        self.forward(LookupEvent::Exception(error.clone()));
    }

    fn note(&mut self, note: &str) {
        self.forward(LookupEvent::Note(note.to_owned()));
    }

    fn end_lookup(&mut self) {
        self.forward(LookupEvent::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LookupEngine;
    use crate::testing::{match_all_model, sample_dictionary};
    use std::time::Duration;

    #[test]
    fn events_cross_the_channel_in_order() {
        let (handler, events_rx) = ChannelResultHandler::new();
        let mut engine = LookupEngine::new(handler);
        engine.do_lookup(&match_all_model(vec![sample_dictionary("sync")]));

        let mut events = Vec::new();
        while let Ok(Some(event)) = events_rx.try_recv() {
            events.push(format!("{event:?}"));
        }
        assert_eq!(
            events,
            [
                "StartModel(Any match \"\")",
                "Dictionary(sync)",
                "Entry(sync-1)",
                "Entry(sync-2)",
                "End",
            ]
        );
    }

    #[test]
    fn dropped_receiver_does_not_fail_the_search() {
        let (handler, events_rx) = ChannelResultHandler::new();
        drop(events_rx);

        let mut engine = LookupEngine::new(handler);
        engine.do_lookup(&match_all_model(vec![sample_dictionary("void")]));
    }

    #[tokio::test]
    async fn stream_can_be_consumed_from_an_async_task() {
        let (handler, events_rx) = ChannelResultHandler::new();

        let worker = std::thread::spawn(move || {
            let mut engine = LookupEngine::new(handler);
            engine.do_lookup(&match_all_model(vec![sample_dictionary("async")]));
        });

        let events_rx = events_rx.to_async();
        let mut events = Vec::new();
        let collected = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let event = events_rx.recv().await.expect("stream should stay open");
                let done = matches!(event, LookupEvent::End);
                events.push(format!("{event:?}"));
                if done {
                    break;
                }
            }
        })
        .await;

        assert!(collected.is_ok(), "timed out waiting for the end event");
        assert_eq!(events.first().map(String::as_str), Some("StartModel(Any match \"\")"));
        assert_eq!(events.last().map(String::as_str), Some("End"));
        assert_eq!(events.len(), 5);

        worker.join().unwrap();
    }
}
