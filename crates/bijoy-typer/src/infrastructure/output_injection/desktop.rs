//! Desktop keyboard and clipboard adapters using `enigo` and `arboard`.
//!
//! `enigo` is opened per call.  The clipboard handle lives as long as the
//! adapter: on X11 and Wayland, `arboard` only serves the text it set while
//! its `Clipboard` is alive, and the paste shortcut comes after `set_text`
//! returns.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::{ClipboardAccess, KeySynthesizer};
use crate::application::replay::InjectionError;

/// Gap between pressing the modifier and the `V` of the paste shortcut.
const CHORD_GAP: Duration = Duration::from_millis(10);

/// Cmd on macOS, Ctrl elsewhere.
fn paste_modifier() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

/// [`KeySynthesizer`] backed by `enigo`.
#[derive(Debug, Default)]
pub struct EnigoKeySynthesizer;

impl EnigoKeySynthesizer {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<Enigo, InjectionError> {
        Enigo::new(&Settings::default())
            .map_err(|e| InjectionError::Synthesis(format!("failed to initialise enigo: {e}")))
    }

    fn click(key: Key) -> Result<(), InjectionError> {
        Self::open()?
            .key(key, Direction::Click)
            .map_err(|e| InjectionError::Synthesis(format!("failed to send {key:?}: {e}")))
    }
}

impl KeySynthesizer for EnigoKeySynthesizer {
    fn tap_backspace(&self) -> Result<(), InjectionError> {
        Self::click(Key::Backspace)
    }

    fn tap_space(&self) -> Result<(), InjectionError> {
        Self::click(Key::Space)
    }

    fn paste_chord(&self) -> Result<(), InjectionError> {
        let mut enigo = Self::open()?;
        let modifier = paste_modifier();
        let synth_err = |e: enigo::InputError| InjectionError::Synthesis(format!("paste shortcut: {e}"));

        enigo.key(modifier, Direction::Press).map_err(synth_err)?;
        thread::sleep(CHORD_GAP);
        let clicked = enigo.key(Key::Unicode('v'), Direction::Click);
        thread::sleep(CHORD_GAP);
        // Always release the modifier, even if the click failed.
        let released = enigo.key(modifier, Direction::Release);
        clicked.map_err(synth_err)?;
        released.map_err(synth_err)
    }

    fn type_text(&self, text: &str) -> Result<(), InjectionError> {
        Self::open()?
            .text(text)
            .map_err(|e| InjectionError::Synthesis(format!("failed to type text: {e}")))
    }

    fn type_char(&self, c: char) -> Result<(), InjectionError> {
        Self::click(Key::Unicode(c))
    }
}

/// [`ClipboardAccess`] backed by one long-lived `arboard` handle.
pub struct ArboardClipboard {
    clipboard: Mutex<Clipboard>,
}

impl ArboardClipboard {
    /// Opens the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::Clipboard`] if no clipboard is available.
    pub fn new() -> Result<Self, InjectionError> {
        let clipboard = Clipboard::new()
            .map_err(|e| InjectionError::Clipboard(format!("failed to open clipboard: {e}")))?;
        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }

    fn handle(&self) -> MutexGuard<'_, Clipboard> {
        self.clipboard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClipboardAccess for ArboardClipboard {
    fn get_text(&self) -> Result<Option<String>, InjectionError> {
        match self.handle().get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(InjectionError::Clipboard(format!("failed to read clipboard: {e}"))),
        }
    }

    fn set_text(&self, text: &str) -> Result<(), InjectionError> {
        self.handle()
            .set_text(text)
            .map_err(|e| InjectionError::Clipboard(format!("failed to set clipboard: {e}")))
    }

    fn clear(&self) -> Result<(), InjectionError> {
        self.handle()
            .clear()
            .map_err(|e| InjectionError::Clipboard(format!("failed to clear clipboard: {e}")))
    }
}
