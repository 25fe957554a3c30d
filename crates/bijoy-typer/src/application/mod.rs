//! Application layer use cases for the typer.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the pure
//! conversion logic (`bijoy-core`) and the infrastructure (OS hooks,
//! keyboard synthesis, config files).  Code in this layer:
//!
//! - **Orchestrates** the conversion pipeline to fulfil a user goal ("when I
//!   finish a word, replace it with its Bengali spelling").
//! - **Depends on abstractions** (traits) rather than concrete adapters, so
//!   the OS layer can be swapped for in-memory mocks in tests.
//! - **Performs no OS calls** of its own.
//!
//! # Sub-modules
//!
//! - **`capture`**      – The state machine that buffers typed characters
//!   and decides when a word is complete.  Runs on every keystroke.
//! - **`replay`**       – Turns a correction plan into timed deletions,
//!   an insertion and a re-emitted space.
//! - **`correct_word`** – Connects the two: drains the input channel and
//!   runs one correction task per completed word.

pub mod capture;
pub mod correct_word;
pub mod replay;
