//! Deciding what to retype after a word has been converted.

pub mod plan;

pub use plan::{plan, CorrectionPlan};
