//! # bijoy-core
//!
//! Pure conversion logic for Bijoy Typer: the legacy-layout mapping table,
//! the greedy transliteration engine, the Bengali reshaper, and the
//! correction planner that decides what must be retyped after each word.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or input
//! hooks.  Everything here is deterministic and can be exercised with plain
//! `#[test]` functions.
//!
//! # Architecture overview (for beginners)
//!
//! Bijoy is a fixed keyboard layout for Bengali that predates Unicode
//! support.  A Bijoy typist presses ASCII keys (`j`, `d`, `f`, ...) and
//! expects Bengali letters.  Bijoy Typer watches those keystrokes and, at
//! each space, replaces the typed ASCII word with its Unicode Bengali form.
//!
//! The conversion pipeline has three stages, each in its own module:
//!
//! - **`mapping`** – The [`MappingTable`] (key sequence → glyph fragment) and
//!   the [`Transliterator`], which scans the typed word left to right taking
//!   the longest key (3, then 2, then 1 code units) at every position.
//!
//! - **`reshape`** – Bijoy is typed in *visual* order: the `ি` vowel sign is
//!   typed before the consonant it follows in Unicode.  A [`ScriptReshaper`]
//!   reorders the complete glyph string into canonical Unicode order.
//!
//! - **`correction`** – Given the typed word and its converted form,
//!   [`plan`] computes how many characters to delete from the live document
//!   and what to type in their place.

pub mod correction;
pub mod mapping;
pub mod reshape;

pub use correction::plan::{plan, CorrectionPlan};
pub use mapping::engine::{Segment, SegmentKind, Transliterator};
pub use mapping::table::{MappingTable, TableError, MAX_KEY_LEN};
pub use reshape::{bengali::BengaliReshaper, IdentityReshaper, ScriptReshaper};
