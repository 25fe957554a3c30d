//! ReplayCoordinator: turns a [`CorrectionPlan`] into synthetic keystrokes.
//!
//! A replay runs strictly in order:
//!
//! ```text
//! settle ─▶ delete × N ─▶ insert text ─▶ re-emit space ─▶ drain
//! ```
//!
//! The pauses between steps give the target application time to consume each
//! synthetic event before the next one arrives.  Every pause goes through
//! `tokio::time::sleep`, so tests can run a full replay under a paused clock.
//!
//! The coordinator depends only on the [`OutputInjector`] trait; the real
//! keyboard/clipboard adapters live in
//! `infrastructure::output_injection`.
//!
//! # Clipboard restore
//!
//! A paste-based insertion hands back the clipboard text it displaced, and
//! the coordinator puts it back after `clipboard_restore`.  At most one
//! restore is pending.  An insertion that starts while one is pending
//! cancels it first and carries the older snapshot forward, so a quick run
//! of pasted words always ends with the user's own text back in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bijoy_core::CorrectionPlan;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Error type for a single injection primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// The OS refused or failed to synthesise the event.
    #[error("key synthesis failed: {0}")]
    Synthesis(String),
    /// The clipboard could not be read or written.
    #[error("clipboard error: {0}")]
    Clipboard(String),
    /// Every configured insertion strategy failed.
    #[error("all {attempts} insertion strategies failed; last error: {last}")]
    AllStrategiesFailed { attempts: usize, last: String },
    /// No insertion strategy is configured.
    #[error("no insertion strategy configured")]
    NoStrategies,
}

/// Clipboard contents saved before a paste-based insertion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardSnapshot {
    previous: Option<String>,
}

impl ClipboardSnapshot {
    /// `previous` is `None` when the clipboard held no text.
    pub fn new(previous: Option<String>) -> Self {
        Self { previous }
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn into_previous(self) -> Option<String> {
        self.previous
    }
}

/// How a piece of text ended up in the target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// Synthesised as key events.
    Typed { strategy: &'static str },
    /// Pasted through the clipboard, which must be restored later.
    Pasted {
        strategy: &'static str,
        snapshot: ClipboardSnapshot,
    },
}

impl Insertion {
    /// Name of the strategy that succeeded.
    pub fn strategy(&self) -> &'static str {
        match self {
            Insertion::Typed { strategy } | Insertion::Pasted { strategy, .. } => strategy,
        }
    }
}

/// Trait for emitting synthetic edits into the focused application.
///
/// Infrastructure implementations drive the OS keyboard and clipboard;
/// test implementations record calls.
#[async_trait]
pub trait OutputInjector: Send + Sync {
    /// Deletes one character before the cursor (a backspace).
    async fn delete_backward(&self) -> Result<(), InjectionError>;

    /// Inserts `text` at the cursor.
    async fn insert_text(&self, text: &str) -> Result<Insertion, InjectionError>;

    /// Re-emits the word boundary (a space).
    async fn press_boundary(&self) -> Result<(), InjectionError>;

    /// Puts back clipboard contents saved by a paste-based insertion.
    async fn restore_clipboard(&self, snapshot: ClipboardSnapshot) -> Result<(), InjectionError>;
}

/// Pauses between replay steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayTiming {
    /// Before the first deletion, so the user's space is committed.
    pub settle: Duration,
    /// Between consecutive deletions.
    pub backspace: Duration,
    /// After the deletions, before inserting.
    pub pre_insert: Duration,
    /// After inserting, before re-emitting the space.
    pub pre_boundary: Duration,
    /// After the space, before the processing guard is released.
    pub post_replay: Duration,
    /// After a clipboard paste, before the old clipboard is put back.
    pub clipboard_restore: Duration,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            backspace: Duration::from_millis(10),
            pre_insert: Duration::from_millis(50),
            pre_boundary: Duration::from_millis(50),
            post_replay: Duration::from_millis(100),
            clipboard_restore: Duration::from_millis(500),
        }
    }
}

impl ReplayTiming {
    /// All pauses zero.  Handy in tests that don't pause the clock.
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            backspace: Duration::ZERO,
            pre_insert: Duration::ZERO,
            pre_boundary: Duration::ZERO,
            post_replay: Duration::ZERO,
            clipboard_restore: Duration::ZERO,
        }
    }
}

/// What a replay actually did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// Backspaces emitted.
    pub deleted: usize,
    /// Strategy that inserted the text; `None` for a no-op or empty text.
    pub inserted_with: Option<&'static str>,
    /// Whether the space was re-emitted.
    pub boundary_restored: bool,
}

/// Error type for a whole replay.  Every variant records how far the replay
/// got, because by then the document may already have been edited.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("deletion failed after {deleted} of {requested} characters: {source}")]
    Delete {
        deleted: usize,
        requested: usize,
        #[source]
        source: InjectionError,
    },
    #[error("insertion failed after deleting {deleted} characters: {source}")]
    Insert {
        deleted: usize,
        #[source]
        source: InjectionError,
    },
    #[error("boundary re-emission failed after replacing {deleted} characters: {source}")]
    Boundary {
        deleted: usize,
        #[source]
        source: InjectionError,
    },
}

impl ReplayError {
    /// Number of characters already removed from the document.
    pub fn deleted(&self) -> usize {
        match self {
            ReplayError::Delete { deleted, .. }
            | ReplayError::Insert { deleted, .. }
            | ReplayError::Boundary { deleted, .. } => *deleted,
        }
    }
}

/// A clipboard restore waiting out its delay.
///
/// `claimed` is set by whichever side acts first: the task when it starts
/// writing, or [`ReplayCoordinator::cancel_pending_restore`].
struct PendingRestore {
    snapshot: ClipboardSnapshot,
    claimed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Executes correction plans against an [`OutputInjector`].
pub struct ReplayCoordinator {
    injector: Arc<dyn OutputInjector>,
    timing: ReplayTiming,
    pending_restore: Mutex<Option<PendingRestore>>,
}

impl ReplayCoordinator {
    /// Creates a coordinator that injects through `injector`.
    pub fn new(injector: Arc<dyn OutputInjector>, timing: ReplayTiming) -> Self {
        Self {
            injector,
            timing,
            pending_restore: Mutex::new(None),
        }
    }

    pub fn timing(&self) -> &ReplayTiming {
        &self.timing
    }

    /// Replays `plan`.  On error the remaining steps are skipped; the caller
    /// is still responsible for releasing the processing guard.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] describing the step that failed.
    pub async fn execute(&self, plan: CorrectionPlan) -> Result<ReplayReport, ReplayError> {
        sleep(self.timing.settle).await;

        let (delete_count, insert_text) = match plan {
            CorrectionPlan::NoOp => {
                debug!("word unchanged; nothing to replay");
                return Ok(ReplayReport::default());
            }
            CorrectionPlan::Replace {
                delete_count,
                insert_text,
            } => (delete_count, insert_text),
        };

        let mut report = ReplayReport::default();

        for i in 0..delete_count {
            if i > 0 {
                sleep(self.timing.backspace).await;
            }
            if let Err(source) = self.injector.delete_backward().await {
                return Err(ReplayError::Delete {
                    deleted: report.deleted,
                    requested: delete_count,
                    source,
                });
            }
            report.deleted += 1;
        }

        sleep(self.timing.pre_insert).await;

        if !insert_text.is_empty() {
            // The clipboard may still hold the previous word's paste.
            let carried = self.cancel_pending_restore().await;
            match self.injector.insert_text(&insert_text).await {
                Ok(insertion) => {
                    report.inserted_with = Some(insertion.strategy());
                    match (insertion, carried) {
                        (_, Some(original)) => self.schedule_clipboard_restore(original),
                        (Insertion::Pasted { snapshot, .. }, None) => {
                            self.schedule_clipboard_restore(snapshot)
                        }
                        (Insertion::Typed { .. }, None) => {}
                    }
                }
                Err(source) => {
                    if let Some(original) = carried {
                        self.schedule_clipboard_restore(original);
                    }
                    error!(
                        deleted = report.deleted,
                        "could not insert {insert_text:?}: {source}; the original word stays deleted"
                    );
                    return Err(ReplayError::Insert {
                        deleted: report.deleted,
                        source,
                    });
                }
            }
        }

        sleep(self.timing.pre_boundary).await;
        if let Err(source) = self.injector.press_boundary().await {
            return Err(ReplayError::Boundary {
                deleted: report.deleted,
                source,
            });
        }
        report.boundary_restored = true;

        // Let the synthetic events drain while the guard still blocks them.
        sleep(self.timing.post_replay).await;

        debug!(?report, "replay finished");
        Ok(report)
    }

    /// Restores the clipboard on a detached task after `clipboard_restore`.
    fn schedule_clipboard_restore(&self, snapshot: ClipboardSnapshot) {
        let injector = Arc::clone(&self.injector);
        let delay = self.timing.clipboard_restore;
        let restored = snapshot.clone();
        let claimed = Arc::new(AtomicBool::new(false));
        let task_claimed = Arc::clone(&claimed);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if task_claimed.swap(true, Ordering::AcqRel) {
                return;
            }
            if let Err(e) = injector.restore_clipboard(restored).await {
                warn!("failed to restore clipboard: {e}");
            }
        });
        let replaced = self
            .pending_restore
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingRestore {
                snapshot,
                claimed,
                task,
            });
        if let Some(stale) = replaced {
            stale.claimed.store(true, Ordering::Release);
            stale.task.abort();
        }
    }

    /// Takes over the pending restore.  Returns its snapshot if the restore
    /// had not started; otherwise waits for it to finish and returns `None`.
    async fn cancel_pending_restore(&self) -> Option<ClipboardSnapshot> {
        let pending = self
            .pending_restore
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        if pending.claimed.swap(true, Ordering::AcqRel) {
            // Already writing; the clipboard holds the user's text afterwards.
            let _ = pending.task.await;
            return None;
        }
        pending.task.abort();
        debug!("clipboard restore postponed by a new insertion");
        Some(pending.snapshot)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
