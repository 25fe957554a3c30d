//! Legacy key sequence tables and the greedy transliteration pass.
//!
//! The [`table::MappingTable`] is loaded once at startup and never mutated.
//! The [`engine::Transliterator`] borrows it for every conversion.

pub mod engine;
pub mod table;

pub use engine::Transliterator;
pub use table::{MappingTable, TableError};
