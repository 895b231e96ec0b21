use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::LookupConfig;
use crate::engine::{CancelSignal, LookupEngine};
use crate::handler::LookupResultHandler;
use crate::model::LookupModel;

enum Command {
    Search { id: u64, model: LookupModel },
    Shutdown,
}

/// Runs the lookup engine on its own worker thread.
///
/// `submit` returns immediately; results arrive through the handler on
/// the worker thread. Submitting while a search is running replaces it:
/// the running search is cancelled at its next match boundary and
/// finishes its stream with an end event before the new search starts,
/// so the events of two searches never interleave. Submissions that are
/// superseded before they start are discarded without emitting anything.
///
/// The worker is created once and parks on its command channel between
/// searches.
pub struct BackgroundLookupEngine {
    command_tx: kanal::Sender<Command>,
    latest: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
    dispose_timeout: Duration,
}

impl BackgroundLookupEngine {
    pub fn new(handler: impl LookupResultHandler + 'static) -> Self {
        Self::with_config(handler, &LookupConfig::default())
    }

    pub fn with_config(handler: impl LookupResultHandler + 'static, config: &LookupConfig) -> Self {
        let (command_tx, command_rx) = kanal::unbounded();
        let latest = Arc::new(AtomicU64::new(0));

        let engine = LookupEngine::with_config(handler, config);
        let worker_latest = latest.clone();
        let worker = thread::spawn(move || worker_loop(engine, command_rx, worker_latest));

        Self {
            command_tx,
            latest,
            worker: Some(worker),
            dispose_timeout: Duration::from_millis(config.dispose_timeout_ms),
        }
    }

    /// Start a new search, aborting any search in progress. Never
    /// blocks.
    pub fn submit(&mut self, model: LookupModel) {
        // bump first so an in-flight search observes the cancellation
        // before the new command is even delivered
        let id = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if self.command_tx.send(Command::Search { id, model }).is_err() {
            tracing::warn!("lookup worker is not running, submission dropped");
        }
    }

    /// Cancel any running search and shut the worker down, waiting a
    /// bounded time for the thread to exit. A worker that fails to stop
    /// in time is reported and leaked, not joined forever.
    pub fn dispose(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.latest.fetch_add(1, Ordering::AcqRel);
        let _ = self.command_tx.send(Command::Shutdown);

        let deadline = Instant::now() + self.dispose_timeout;
        while !worker.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        if worker.is_finished() {
            let _ = worker.join();
        } else {
            tracing::warn!(
                "lookup worker still alive after {:?}",
                self.dispose_timeout
            );
        }
    }
}

impl Drop for BackgroundLookupEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn worker_loop<H: LookupResultHandler>(
    mut engine: LookupEngine<H>,
    command_rx: kanal::Receiver<Command>,
    latest: Arc<AtomicU64>,
) {
    while let Ok(mut command) = command_rx.recv() {
        // collapse the backlog, only the newest command matters
        while let Ok(Some(newer)) = command_rx.try_recv() {
            command = newer;
        }

        match command {
            Command::Shutdown => break,
            Command::Search { id, model } => {
                if latest.load(Ordering::Acquire) != id {
                    // superseded before it started
                    continue;
                }
                engine.do_lookup_cancellable(&model, &CancelSignal::new(latest.clone(), id));
            }
        }
    }
    tracing::debug!("lookup worker exiting");
}
