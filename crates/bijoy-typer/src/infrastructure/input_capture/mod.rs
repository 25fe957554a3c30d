//! Input capture infrastructure.
//!
//! A global keyboard/mouse hook runs on its own OS thread and forwards
//! [`CaptureEvent`]s over an `mpsc` channel.  The hook callback does nothing
//! but translate and send, so it can never be stalled by the word
//! correction running elsewhere.
//!
//! # Platform implementation
//!
//! With the `desktop` feature enabled, [`desktop::RdevInputSource`] uses the
//! `rdev` crate to listen to every key and button press system-wide.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows tests to inject synthetic events through
//! [`mock::MockInputSource`] without installing a real hook.

use std::sync::mpsc;

pub mod mock;

#[cfg(feature = "desktop")]
pub mod desktop;

/// A captured input event, already reduced to what the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A printable character was typed.
    Character(char),
    /// The space bar: the end of a word.
    Boundary,
    /// The backspace key.
    Backspace,
    /// The enter key.
    Enter,
    /// The tab key.
    Tab,
    /// The configured activation hotkey (F12 by default).
    ToggleActivation,
    /// A mouse button went down; the text cursor may have moved.
    PointerPress { button: MouseButton },
}

/// Mouse button identifier used in [`CaptureEvent::PointerPress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install global input hook: {0}")]
    HookInstallFailed(String),
    #[error("unknown activation key name: {0:?}")]
    UnknownKey(String),
    #[error("capture service has already been stopped")]
    AlreadyStopped,
}

/// Trait abstracting input event production.
///
/// The engine subscribes exactly once for its whole lifetime.
pub trait InputSource: Send {
    /// Starts the input source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError>;
    /// Stops delivering events; the receiver disconnects once drained.
    fn stop(&self);
}
