//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`CaptureEvent`]s without requiring a
//! global OS hook.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{CaptureError, CaptureEvent, InputSource};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<CaptureEvent>>>>,
    start_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            start_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: CaptureEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockInputSource::inject_event called before start()");
        }
    }

    /// Injects one event per character of `text`, turning spaces into
    /// [`CaptureEvent::Boundary`].
    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            let event = if c == ' ' {
                CaptureEvent::Boundary
            } else {
                CaptureEvent::Character(c)
            };
            self.inject_event(event);
        }
    }

    /// Returns how many times `start()` was called.
    pub fn start_count(&self) -> u32 {
        *self.start_count.lock().expect("lock poisoned")
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        *self.start_count.lock().expect("lock poisoned") += 1;
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}
