//! Recording mocks for output injection.
//!
//! The real adapters press keys on the test machine and overwrite its
//! clipboard.  The mocks here replace those calls with in-memory recording:
//! every emitted action is pushed into a `Mutex<Vec<...>>` so assertions can
//! check exactly what was emitted and in what order.
//!
//! # Failure switches
//!
//! Each mock has builder methods (`fail_insert()`, `fail_text()`, ...) that
//! make a specific call return an [`InjectionError`], to exercise the error
//! paths without a broken OS.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ClipboardAccess, KeySynthesizer};
use crate::application::replay::{ClipboardSnapshot, InjectionError, Insertion, OutputInjector};

// ── MockOutputInjector ────────────────────────────────────────────────────────

/// One call recorded by [`MockOutputInjector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedAction {
    DeleteBackward,
    InsertText(String),
    PressBoundary,
    RestoreClipboard(Option<String>),
}

/// An [`OutputInjector`] that records calls instead of touching the OS.
#[derive(Debug, Default)]
pub struct MockOutputInjector {
    actions: Mutex<Vec<InjectedAction>>,
    /// Number of deletions that succeed before the next one fails.
    fail_delete_after: Option<usize>,
    fail_insert: bool,
    /// When set, insertions report a paste with this clipboard snapshot.
    paste_snapshot: Option<ClipboardSnapshot>,
}

impl MockOutputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `n` deletions succeed, then fails every further one.
    pub fn fail_delete_after(mut self, n: usize) -> Self {
        self.fail_delete_after = Some(n);
        self
    }

    /// Makes every `insert_text` call fail.
    pub fn fail_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    /// Makes insertions report a clipboard paste that displaced `previous`.
    pub fn paste_with_clipboard(mut self, previous: &str) -> Self {
        self.paste_snapshot = Some(ClipboardSnapshot::new(Some(previous.to_string())));
        self
    }

    /// Returns a copy of every recorded call, in order.
    pub fn actions(&self) -> Vec<InjectedAction> {
        self.actions.lock().expect("lock poisoned").clone()
    }

    /// The text a real editor would contain after replaying the recorded
    /// actions on top of `before`.
    pub fn apply_to(&self, before: &str) -> String {
        let mut doc: Vec<char> = before.chars().collect();
        for action in self.actions() {
            match action {
                InjectedAction::DeleteBackward => {
                    doc.pop();
                }
                InjectedAction::InsertText(text) => doc.extend(text.chars()),
                InjectedAction::PressBoundary => doc.push(' '),
                InjectedAction::RestoreClipboard(_) => {}
            }
        }
        doc.into_iter().collect()
    }

    fn record(&self, action: InjectedAction) {
        self.actions.lock().expect("lock poisoned").push(action);
    }
}

#[async_trait]
impl OutputInjector for MockOutputInjector {
    async fn delete_backward(&self) -> Result<(), InjectionError> {
        if let Some(limit) = self.fail_delete_after {
            let done = self
                .actions()
                .iter()
                .filter(|a| **a == InjectedAction::DeleteBackward)
                .count();
            if done >= limit {
                return Err(InjectionError::Synthesis("mock failure".into()));
            }
        }
        self.record(InjectedAction::DeleteBackward);
        Ok(())
    }

    async fn insert_text(&self, text: &str) -> Result<Insertion, InjectionError> {
        if self.fail_insert {
            return Err(InjectionError::AllStrategiesFailed {
                attempts: 1,
                last: "mock failure".into(),
            });
        }
        self.record(InjectedAction::InsertText(text.to_string()));
        Ok(match &self.paste_snapshot {
            Some(snapshot) => Insertion::Pasted {
                strategy: "mock",
                snapshot: snapshot.clone(),
            },
            None => Insertion::Typed { strategy: "mock" },
        })
    }

    async fn press_boundary(&self) -> Result<(), InjectionError> {
        self.record(InjectedAction::PressBoundary);
        Ok(())
    }

    async fn restore_clipboard(&self, snapshot: ClipboardSnapshot) -> Result<(), InjectionError> {
        self.record(InjectedAction::RestoreClipboard(snapshot.into_previous()));
        Ok(())
    }
}

// ── MockKeySynthesizer ────────────────────────────────────────────────────────

/// One key action recorded by [`MockKeySynthesizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesizedKey {
    Backspace,
    Space,
    PasteChord,
    Text(String),
    Char(char),
}

/// A [`KeySynthesizer`] that records key actions.
#[derive(Debug, Default)]
pub struct MockKeySynthesizer {
    keys: Mutex<Vec<SynthesizedKey>>,
    fail_text: bool,
    fail_paste: bool,
    fail_chars: bool,
}

impl MockKeySynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes bulk `type_text` fail.
    pub fn fail_text(mut self) -> Self {
        self.fail_text = true;
        self
    }

    /// Makes the paste shortcut fail.
    pub fn fail_paste(mut self) -> Self {
        self.fail_paste = true;
        self
    }

    /// Makes every `type_char` fail.
    pub fn fail_chars(mut self) -> Self {
        self.fail_chars = true;
        self
    }

    /// Returns a copy of every successful key action, in order.
    pub fn keys(&self) -> Vec<SynthesizedKey> {
        self.keys.lock().expect("lock poisoned").clone()
    }

    fn record(&self, fail: bool, key: SynthesizedKey) -> Result<(), InjectionError> {
        if fail {
            return Err(InjectionError::Synthesis(format!("mock failure on {key:?}")));
        }
        self.keys.lock().expect("lock poisoned").push(key);
        Ok(())
    }
}

impl KeySynthesizer for MockKeySynthesizer {
    fn tap_backspace(&self) -> Result<(), InjectionError> {
        self.record(false, SynthesizedKey::Backspace)
    }

    fn tap_space(&self) -> Result<(), InjectionError> {
        self.record(false, SynthesizedKey::Space)
    }

    fn paste_chord(&self) -> Result<(), InjectionError> {
        self.record(self.fail_paste, SynthesizedKey::PasteChord)
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        self.record(self.fail_text, SynthesizedKey::Text(text.to_string()))
    }

    fn type_char(&self, c: char) -> Result<(), InjectionError> {
        self.record(self.fail_chars, SynthesizedKey::Char(c))
    }
}

// ── MockClipboard ─────────────────────────────────────────────────────────────

/// An in-memory [`ClipboardAccess`].
#[derive(Debug, Default)]
pub struct MockClipboard {
    contents: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MockClipboard {
    /// An empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that already holds `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            contents: Mutex::new(Some(text.to_string())),
            writes: Mutex::new(0),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().expect("lock poisoned").clone()
    }

    /// Number of `set_text` and `clear` calls.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().expect("lock poisoned")
    }

    fn write(&self, value: Option<String>) {
        *self.contents.lock().expect("lock poisoned") = value;
        *self.writes.lock().expect("lock poisoned") += 1;
    }
}

impl ClipboardAccess for MockClipboard {
    fn get_text(&self) -> Result<Option<String>, InjectionError> {
        Ok(self.contents())
    }

    fn set_text(&self, text: &str) -> Result<(), InjectionError> {
        self.write(Some(text.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), InjectionError> {
        self.write(None);
        Ok(())
    }
}
