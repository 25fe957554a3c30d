//! CaptureStateMachine: turns the raw key stream into completed words.
//!
//! The machine owns the three pieces of mutable engine state:
//!
//! - `active`     – toggled by the activation hotkey; while inactive nothing
//!   is buffered and no word is ever dispatched.
//! - `processing` – raised when a word is handed to the replay and lowered
//!   only by [`CaptureStateMachine::complete`].  While raised, every key the
//!   replay itself synthesises (backspaces, Bengali text, the trailing space)
//!   is ignored, so the engine never reacts to its own output.
//! - `buffer`     – the ASCII characters typed since the last boundary.
//!
//! # Transition table
//!
//! | Event            | Guard                               | Effect                                   |
//! |------------------|-------------------------------------|------------------------------------------|
//! | Character(c)     | inactive or processing              | ignored                                  |
//! | Character(c)     | c not ASCII                         | ignored                                  |
//! | Character(c)     | otherwise                           | append `c`                               |
//! | Boundary         | active, idle, buffer non-empty      | take buffer, raise `processing`, dispatch |
//! | Backspace        | active, idle                        | pop last char (no-op when empty)         |
//! | Enter / Tab      | active, idle                        | clear buffer                             |
//! | PointerPress     | any                                 | clear buffer                             |
//! | ToggleActivation | any                                 | flip `active`                            |
//!
//! The machine is pure and synchronous: it performs no I/O and never blocks.
//! The caller wraps it in a `Mutex` and runs the replay elsewhere.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::input_capture::CaptureEvent;

/// Default cap on the word buffer, in characters.
pub const DEFAULT_MAX_WORD_LEN: usize = 64;

/// Coarse engine mode derived from the two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Inactive,
    ActiveIdle,
    /// A replay is in flight.
    ActiveProcessing,
}

/// Why an event left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Inactive,
    Processing,
    NonAscii,
    EmptyBuffer,
}

/// A handler fault.  The buffer is discarded; `processing` is left alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureFault {
    #[error("word buffer exceeded {limit} characters")]
    BufferOverflow { limit: usize },
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The character was appended to the buffer.
    Buffered,
    /// The last buffered character was removed.
    Erased,
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// A completed word was taken from the buffer; the caller must replay it
    /// and then call [`CaptureStateMachine::complete`].
    Dispatched(String),
    /// The buffer was cleared.
    Reset,
    /// Activation was flipped; carries the new value.
    Toggled { active: bool },
    /// `processing` was lowered.
    Completed,
    /// The event faulted; the buffer was discarded.
    Fault(CaptureFault),
}

/// The capture state machine.  See the module docs for the transition table.
#[derive(Debug)]
pub struct CaptureStateMachine {
    active: bool,
    processing: bool,
    buffer: String,
    max_word_len: usize,
}

impl CaptureStateMachine {
    /// Creates an idle machine.  `max_word_len` bounds the buffer; a longer
    /// run of characters without a boundary is treated as a fault.
    pub fn new(start_active: bool, max_word_len: usize) -> Self {
        Self {
            active: start_active,
            processing: false,
            buffer: String::new(),
            max_word_len: max_word_len.max(1),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// The characters buffered since the last boundary.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn mode(&self) -> EngineMode {
        match (self.active, self.processing) {
            (false, _) => EngineMode::Inactive,
            (true, false) => EngineMode::ActiveIdle,
            (true, true) => EngineMode::ActiveProcessing,
        }
    }

    /// Applies one event.  Faults are absorbed here: the buffer is cleared
    /// and [`Outcome::Fault`] is returned.
    pub fn handle(&mut self, event: &CaptureEvent) -> Outcome {
        match self.apply(event) {
            Ok(outcome) => outcome,
            Err(fault) => {
                warn!("capture fault on {event:?}: {fault}; discarding buffer");
                self.recover_from_fault();
                Outcome::Fault(fault)
            }
        }
    }

    /// Lowers `processing` once a replay has finished, successfully or not.
    pub fn complete(&mut self) -> Outcome {
        if self.processing {
            debug!("replay finished; accepting input again");
        }
        self.processing = false;
        Outcome::Completed
    }

    /// Discards the buffer after a fault.  `processing` is left untouched;
    /// only the replay's completion may lower it.
    pub fn recover_from_fault(&mut self) {
        self.buffer.clear();
    }

    fn apply(&mut self, event: &CaptureEvent) -> Result<Outcome, CaptureFault> {
        match event {
            CaptureEvent::ToggleActivation => {
                self.active = !self.active;
                info!(
                    "transliteration {}",
                    if self.active { "activated" } else { "deactivated" }
                );
                Ok(Outcome::Toggled {
                    active: self.active,
                })
            }
            CaptureEvent::PointerPress { .. } => {
                self.buffer.clear();
                Ok(Outcome::Reset)
            }
            _ if !self.active => Ok(Outcome::Ignored(IgnoreReason::Inactive)),
            _ if self.processing => Ok(Outcome::Ignored(IgnoreReason::Processing)),
            CaptureEvent::Character(c) => {
                if !c.is_ascii() {
                    return Ok(Outcome::Ignored(IgnoreReason::NonAscii));
                }
                if self.buffer.len() >= self.max_word_len {
                    return Err(CaptureFault::BufferOverflow {
                        limit: self.max_word_len,
                    });
                }
                self.buffer.push(*c);
                Ok(Outcome::Buffered)
            }
            CaptureEvent::Boundary => {
                if self.buffer.is_empty() {
                    return Ok(Outcome::Ignored(IgnoreReason::EmptyBuffer));
                }
                // Raised before the caller releases the lock so that the
                // replay's own keystrokes are already suppressed.
                self.processing = true;
                let word = std::mem::take(&mut self.buffer);
                debug!(word = %word, "word completed");
                Ok(Outcome::Dispatched(word))
            }
            CaptureEvent::Backspace => match self.buffer.pop() {
                Some(_) => Ok(Outcome::Erased),
                None => Ok(Outcome::Ignored(IgnoreReason::EmptyBuffer)),
            },
            CaptureEvent::Enter | CaptureEvent::Tab => {
                self.buffer.clear();
                Ok(Outcome::Reset)
            }
        }
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new(false, DEFAULT_MAX_WORD_LEN)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_capture::MouseButton;

    fn active_machine() -> CaptureStateMachine {
        CaptureStateMachine::new(true, DEFAULT_MAX_WORD_LEN)
    }

    fn feed(machine: &mut CaptureStateMachine, text: &str) {
        for c in text.chars() {
            machine.handle(&CaptureEvent::Character(c));
        }
    }

    // ── Activation ────────────────────────────────────────────────────────────

    #[test]
    fn test_default_machine_starts_inactive_and_idle() {
        let machine = CaptureStateMachine::default();
        assert_eq!(machine.mode(), EngineMode::Inactive);
        assert!(!machine.is_processing());
        assert_eq!(machine.buffer(), "");
    }

    #[test]
    fn test_toggle_flips_activation_and_reports_new_value() {
        // Arrange
        let mut machine = CaptureStateMachine::default();

        // Act
        let first = machine.handle(&CaptureEvent::ToggleActivation);
        let second = machine.handle(&CaptureEvent::ToggleActivation);

        // Assert
        assert_eq!(first, Outcome::Toggled { active: true });
        assert_eq!(second, Outcome::Toggled { active: false });
    }

    #[test]
    fn test_inactive_machine_ignores_characters_and_boundaries() {
        // Arrange
        let mut machine = CaptureStateMachine::default();

        // Act
        let typed = machine.handle(&CaptureEvent::Character('j'));
        let boundary = machine.handle(&CaptureEvent::Boundary);

        // Assert
        assert_eq!(typed, Outcome::Ignored(IgnoreReason::Inactive));
        assert_eq!(boundary, Outcome::Ignored(IgnoreReason::Inactive));
        assert_eq!(machine.buffer(), "");
    }

    #[test]
    fn test_toggle_keeps_buffer_contents() {
        let mut machine = active_machine();
        feed(&mut machine, "jf");

        machine.handle(&CaptureEvent::ToggleActivation);

        assert_eq!(machine.buffer(), "jf");
        assert_eq!(machine.mode(), EngineMode::Inactive);
    }

    // ── Buffering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_ascii_characters_are_buffered_in_order() {
        let mut machine = active_machine();

        let outcome = machine.handle(&CaptureEvent::Character('g'));
        feed(&mut machine, "fmfv");

        assert_eq!(outcome, Outcome::Buffered);
        assert_eq!(machine.buffer(), "gfmfv");
    }

    #[test]
    fn test_non_ascii_characters_are_ignored() {
        let mut machine = active_machine();
        feed(&mut machine, "k");

        let outcome = machine.handle(&CaptureEvent::Character('ক'));

        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NonAscii));
        assert_eq!(machine.buffer(), "k");
    }

    #[test]
    fn test_backspace_pops_last_character() {
        let mut machine = active_machine();
        feed(&mut machine, "kix");

        let outcome = machine.handle(&CaptureEvent::Backspace);

        assert_eq!(outcome, Outcome::Erased);
        assert_eq!(machine.buffer(), "ki");
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_a_no_op() {
        let mut machine = active_machine();

        let outcome = machine.handle(&CaptureEvent::Backspace);

        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::EmptyBuffer));
        assert_eq!(machine.buffer(), "");
    }

    #[test]
    fn test_enter_and_tab_clear_buffer() {
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        assert_eq!(machine.handle(&CaptureEvent::Enter), Outcome::Reset);
        assert_eq!(machine.buffer(), "");

        feed(&mut machine, "jf");
        assert_eq!(machine.handle(&CaptureEvent::Tab), Outcome::Reset);
        assert_eq!(machine.buffer(), "");
    }

    #[test]
    fn test_pointer_press_clears_buffer_even_when_inactive() {
        // Arrange
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        machine.handle(&CaptureEvent::ToggleActivation);

        // Act
        let outcome = machine.handle(&CaptureEvent::PointerPress {
            button: MouseButton::Left,
        });

        // Assert
        assert_eq!(outcome, Outcome::Reset);
        assert_eq!(machine.buffer(), "");
    }

    // ── Dispatch and the processing guard ─────────────────────────────────────

    #[test]
    fn test_boundary_dispatches_word_and_raises_processing() {
        // Arrange
        let mut machine = active_machine();
        feed(&mut machine, "ki");

        // Act
        let outcome = machine.handle(&CaptureEvent::Boundary);

        // Assert
        assert_eq!(outcome, Outcome::Dispatched("ki".to_string()));
        assert!(machine.is_processing());
        assert_eq!(machine.mode(), EngineMode::ActiveProcessing);
        assert_eq!(machine.buffer(), "", "buffer must be empty after dispatch");
    }

    #[test]
    fn test_boundary_on_empty_buffer_dispatches_nothing() {
        let mut machine = active_machine();

        let outcome = machine.handle(&CaptureEvent::Boundary);

        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::EmptyBuffer));
        assert!(!machine.is_processing());
    }

    #[test]
    fn test_events_during_processing_are_ignored() {
        // Arrange: a word is in flight
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        machine.handle(&CaptureEvent::Boundary);

        // Act: the replay's own output comes back through the hook
        let outcomes = [
            machine.handle(&CaptureEvent::Backspace),
            machine.handle(&CaptureEvent::Character('a')),
            machine.handle(&CaptureEvent::Boundary),
            machine.handle(&CaptureEvent::Enter),
        ];

        // Assert
        for outcome in outcomes {
            assert_eq!(outcome, Outcome::Ignored(IgnoreReason::Processing));
        }
        assert_eq!(machine.buffer(), "");
    }

    #[test]
    fn test_pointer_press_during_processing_clears_but_keeps_guard() {
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        machine.handle(&CaptureEvent::Boundary);

        machine.handle(&CaptureEvent::PointerPress {
            button: MouseButton::Right,
        });

        assert!(machine.is_processing());
    }

    #[test]
    fn test_complete_lowers_processing_and_accepts_input_again() {
        // Arrange
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        machine.handle(&CaptureEvent::Boundary);

        // Act
        let outcome = machine.complete();
        let typed = machine.handle(&CaptureEvent::Character('j'));

        // Assert
        assert_eq!(outcome, Outcome::Completed);
        assert!(!machine.is_processing());
        assert_eq!(typed, Outcome::Buffered);
    }

    #[test]
    fn test_complete_when_idle_is_harmless() {
        let mut machine = active_machine();
        assert_eq!(machine.complete(), Outcome::Completed);
        assert_eq!(machine.mode(), EngineMode::ActiveIdle);
    }

    // ── Faults ────────────────────────────────────────────────────────────────

    #[test]
    fn test_buffer_overflow_faults_and_discards_buffer() {
        // Arrange
        let mut machine = CaptureStateMachine::new(true, 3);
        feed(&mut machine, "abc");

        // Act
        let outcome = machine.handle(&CaptureEvent::Character('d'));

        // Assert
        assert_eq!(
            outcome,
            Outcome::Fault(CaptureFault::BufferOverflow { limit: 3 })
        );
        assert_eq!(machine.buffer(), "");
        assert!(machine.is_active(), "a fault must not deactivate the engine");
    }

    #[test]
    fn test_recover_from_fault_leaves_processing_untouched() {
        let mut machine = active_machine();
        feed(&mut machine, "ki");
        machine.handle(&CaptureEvent::Boundary);

        machine.recover_from_fault();

        assert!(machine.is_processing());
    }
}
