//! CorrectWordUseCase: the live transliteration loop.
//!
//! Wires the pieces together:
//!
//! ```text
//! InputSource ──mpsc──▶ run_pump ──▶ CaptureStateMachine ──Dispatched(word)──┐
//!                                                                            │
//!        ┌──────────────────── one tokio task per word ◀────────────────────┘
//!        ▼
//!   Transliterator ──▶ plan() ──▶ ReplayCoordinator ──▶ OutputInjector
//!        │
//!        └── CompletionGuard (drop) ──▶ CaptureStateMachine::complete()
//! ```
//!
//! The pump only takes the state lock for the duration of one transition and
//! never waits on injection.  A dispatched word is corrected on its own task;
//! the state machine's `processing` flag guarantees there is at most one such
//! task at a time.
//!
//! # Completion guard
//!
//! The task owns a [`CompletionGuard`] whose `Drop` lowers `processing`.
//! It runs when the task returns, when the replay fails, when the task
//! panics and when the runtime drops the task during shutdown.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use bijoy_core::{plan, Transliterator};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::application::capture::{CaptureStateMachine, EngineMode, Outcome};
use crate::application::replay::{ReplayCoordinator, ReplayError, ReplayReport};
use crate::infrastructure::input_capture::CaptureEvent;

/// Result of one word correction task.
pub type CorrectionResult = Result<ReplayReport, ReplayError>;

/// What [`CorrectWordUseCase::handle_event`] did with an event.
#[derive(Debug)]
pub struct Handled {
    pub outcome: Outcome,
    /// The correction task, when the event completed a word.
    pub correction: Option<JoinHandle<CorrectionResult>>,
}

/// Locks the state, recovering from poisoning.  A panic while the lock was
/// held leaves the machine in a valid state, since every transition is a
/// single field update.
fn lock_state(state: &Mutex<CaptureStateMachine>) -> MutexGuard<'_, CaptureStateMachine> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lowers `processing` when dropped.
struct CompletionGuard {
    state: Arc<Mutex<CaptureStateMachine>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        lock_state(&self.state).complete();
    }
}

/// The live correction service.
pub struct CorrectWordUseCase {
    state: Arc<Mutex<CaptureStateMachine>>,
    transliterator: Transliterator,
    coordinator: Arc<ReplayCoordinator>,
    runtime: Handle,
}

impl CorrectWordUseCase {
    /// Creates the use case.  Correction tasks are spawned on `runtime`, so
    /// [`handle_event`](Self::handle_event) may be called from any thread.
    pub fn new(
        machine: CaptureStateMachine,
        transliterator: Transliterator,
        coordinator: ReplayCoordinator,
        runtime: Handle,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(machine)),
            transliterator,
            coordinator: Arc::new(coordinator),
            runtime,
        }
    }

    pub fn mode(&self) -> EngineMode {
        lock_state(&self.state).mode()
    }

    /// A copy of the word buffer.
    pub fn buffer(&self) -> String {
        lock_state(&self.state).buffer().to_string()
    }

    /// Feeds one event to the state machine and, if it completes a word,
    /// spawns the correction task.
    pub fn handle_event(&self, event: &CaptureEvent) -> Handled {
        let outcome = lock_state(&self.state).handle(event);
        trace!(?event, ?outcome, "event handled");

        let correction = match &outcome {
            Outcome::Dispatched(word) => Some(self.spawn_correction(word.clone())),
            _ => None,
        };
        Handled {
            outcome,
            correction,
        }
    }

    /// Drains `events` until the sender side disconnects.
    ///
    /// Blocks the calling thread; run it on a dedicated thread or with
    /// `tokio::task::spawn_blocking`.  A panic while handling an event is
    /// caught, the buffer is discarded and the pump carries on.
    pub fn run_pump(&self, events: mpsc::Receiver<CaptureEvent>) {
        self.drain_events(events, |uc, event| {
            uc.handle_event(event);
        });
    }

    fn drain_events<F>(&self, events: mpsc::Receiver<CaptureEvent>, handle: F)
    where
        F: Fn(&Self, &CaptureEvent),
    {
        for event in events.iter() {
            let handled = panic::catch_unwind(AssertUnwindSafe(|| handle(self, &event)));
            if handled.is_err() {
                warn!("handler panicked on {event:?}; discarding word buffer");
                lock_state(&self.state).recover_from_fault();
            }
        }
        info!("input channel closed; event pump stopped");
    }

    fn spawn_correction(&self, word: String) -> JoinHandle<CorrectionResult> {
        // Created before spawning so that `processing` is lowered even if the
        // task never gets to run.
        let guard = CompletionGuard {
            state: Arc::clone(&self.state),
        };
        let transliterator = self.transliterator.clone();
        let coordinator = Arc::clone(&self.coordinator);

        self.runtime.spawn(async move {
            let _guard = guard;
            let converted = transliterator.transliterate(&word);
            let correction = plan(&word, &converted);
            debug!(%word, %converted, ?correction, "correcting word");

            let result = coordinator.execute(correction).await;
            if let Err(e) = &result {
                error!("correction of {word:?} failed: {e}");
            }
            result
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
