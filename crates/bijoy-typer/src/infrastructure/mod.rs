//! Infrastructure layer for the typer.
//!
//! Contains OS-facing adapters: the global input hook, keyboard and
//! clipboard injection, and file-system configuration storage.
//!
//! Each adapter sits behind a trait with an in-memory mock, and the real
//! desktop implementations are only compiled with the `desktop` feature.

pub mod input_capture;
pub mod output_injection;
pub mod storage;
