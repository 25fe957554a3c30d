//! Output injection infrastructure.
//!
//! Implements [`OutputInjector`](crate::application::replay::OutputInjector)
//! on top of two small OS-facing traits:
//!
//! - [`KeySynthesizer`]  – taps single keys and types text as key events.
//! - [`ClipboardAccess`] – reads and writes the system clipboard as text.
//!
//! Text insertion is the fragile part: some applications drop synthesised
//! Unicode, others ignore pastes.  [`strategy::StrategyChainInjector`]
//! therefore tries an ordered list of [`strategy::InsertStrategy`] values and
//! keeps the first one that succeeds.
//!
//! # Platform implementation
//!
//! With the `desktop` feature enabled, [`desktop`] provides `enigo`- and
//! `arboard`-backed implementations of both traits.

use serde::{Deserialize, Serialize};

use crate::application::replay::InjectionError;

pub mod mock;
pub mod strategy;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use strategy::{
    BulkTextStrategy, ClipboardPasteStrategy, InsertStrategy, PerCharStrategy,
    StrategyChainInjector,
};

/// Synthesises keyboard input in the focused application.
pub trait KeySynthesizer: Send + Sync {
    /// Presses and releases Backspace.
    fn tap_backspace(&self) -> Result<(), InjectionError>;

    /// Presses and releases Space.
    fn tap_space(&self) -> Result<(), InjectionError>;

    /// Sends the platform paste shortcut (Cmd+V on macOS, Ctrl+V elsewhere).
    fn paste_chord(&self) -> Result<(), InjectionError>;

    /// Types a whole string in one call.
    fn type_text(&self, text: &str) -> Result<(), InjectionError>;

    /// Types a single Unicode scalar value.
    fn type_char(&self, c: char) -> Result<(), InjectionError>;
}

/// Text access to the system clipboard.
#[cfg_attr(test, mockall::automock)]
pub trait ClipboardAccess: Send + Sync {
    /// Returns the current text contents, or `None` if the clipboard holds
    /// no text.
    fn get_text(&self) -> Result<Option<String>, InjectionError>;

    fn set_text(&self, text: &str) -> Result<(), InjectionError>;

    fn clear(&self) -> Result<(), InjectionError>;
}

/// Names of the insertion strategies, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// [`BulkTextStrategy`]
    Bulk,
    /// [`ClipboardPasteStrategy`]
    Clipboard,
    /// [`PerCharStrategy`]
    PerChar,
}

impl StrategyKind {
    /// The default fallback order.
    pub fn default_chain() -> Vec<StrategyKind> {
        vec![
            StrategyKind::Bulk,
            StrategyKind::Clipboard,
            StrategyKind::PerChar,
        ]
    }
}
