//! System-wide keyboard and mouse capture via `rdev`.
//!
//! `rdev::listen` blocks its thread forever, so it runs on a dedicated OS
//! thread.  The callback translates each press into a [`CaptureEvent`] and
//! pushes it into the channel; it never touches engine state directly.
//!
//! `rdev` offers no way to uninstall the hook, so `stop()` only flips a flag
//! that makes the callback drop further events and release the sender.
//!
//! # Permissions
//!
//! On macOS the process needs the Accessibility permission.  On Linux the
//! hook uses the X11 record extension and needs a reachable `DISPLAY`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc, Mutex,
};
use std::thread;

use rdev::{Button, Event, EventType, Key};

use super::{CaptureError, CaptureEvent, InputSource, MouseButton};

/// Resolves a configured hotkey name (`"F12"`, `"ScrollLock"`, ...) to an
/// `rdev` key.
pub fn parse_toggle_key(name: &str) -> Result<Key, CaptureError> {
    let key = match name.trim().to_ascii_lowercase().as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "scrolllock" => Key::ScrollLock,
        "pause" => Key::Pause,
        "insert" => Key::Insert,
        _ => return Err(CaptureError::UnknownKey(name.to_string())),
    };
    Ok(key)
}

/// Translates one raw `rdev` event.  Returns `None` for events the engine
/// ignores (releases, moves, modifiers, non-printing keys).
fn translate(event: &Event, toggle_key: Key) -> Option<CaptureEvent> {
    match event.event_type {
        EventType::KeyPress(key) if key == toggle_key => Some(CaptureEvent::ToggleActivation),
        EventType::KeyPress(Key::Space) => Some(CaptureEvent::Boundary),
        EventType::KeyPress(Key::Backspace) => Some(CaptureEvent::Backspace),
        EventType::KeyPress(Key::Return | Key::KpReturn) => Some(CaptureEvent::Enter),
        EventType::KeyPress(Key::Tab) => Some(CaptureEvent::Tab),
        EventType::KeyPress(_) => {
            // `name` carries the character the layout produced, if any.
            let name = event.name.as_deref()?;
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(CaptureEvent::Character(c)),
                _ => None,
            }
        }
        EventType::ButtonPress(button) => Some(CaptureEvent::PointerPress {
            button: match button {
                Button::Left => MouseButton::Left,
                Button::Right => MouseButton::Right,
                Button::Middle => MouseButton::Middle,
                Button::Unknown(_) => MouseButton::Other,
            },
        }),
        _ => None,
    }
}

/// Global hook input source backed by `rdev`.
pub struct RdevInputSource {
    toggle_key: Key,
    running: Arc<AtomicBool>,
    started: Mutex<bool>,
}

impl RdevInputSource {
    /// Creates a source that reports `toggle_key_name` as
    /// [`CaptureEvent::ToggleActivation`].
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::UnknownKey`] for an unsupported key name.
    pub fn new(toggle_key_name: &str) -> Result<Self, CaptureError> {
        Ok(Self {
            toggle_key: parse_toggle_key(toggle_key_name)?,
            running: Arc::new(AtomicBool::new(true)),
            started: Mutex::new(false),
        })
    }
}

impl InputSource for RdevInputSource {
    fn start(&self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStopped);
        }
        let mut started = self
            .started
            .lock()
            .map_err(|_| CaptureError::HookInstallFailed("state lock poisoned".into()))?;
        if *started {
            return Err(CaptureError::HookInstallFailed(
                "the global hook can only be installed once".into(),
            ));
        }

        let (tx, rx) = mpsc::channel();
        let running = Arc::clone(&self.running);
        let toggle_key = self.toggle_key;

        thread::Builder::new()
            .name("rdev-hook".into())
            .spawn(move || {
                let sender = Mutex::new(Some(tx));
                let callback = move |event: Event| {
                    let Ok(mut guard) = sender.lock() else {
                        return;
                    };
                    if !running.load(Ordering::SeqCst) {
                        // Dropping the sender disconnects the pump.
                        *guard = None;
                        return;
                    }
                    if let (Some(tx), Some(captured)) = (guard.as_ref(), translate(&event, toggle_key)) {
                        if tx.send(captured).is_err() {
                            *guard = None;
                        }
                    }
                };
                if let Err(e) = rdev::listen(callback) {
                    tracing::error!("global input hook terminated: {e:?}");
                }
            })
            .map_err(|e| CaptureError::HookInstallFailed(e.to_string()))?;

        *started = true;
        tracing::info!(?toggle_key, "global input hook installed");
        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
