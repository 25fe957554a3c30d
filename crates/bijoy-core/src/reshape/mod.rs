//! Script reshaping: turning a visually-ordered glyph string into canonical
//! Unicode order.
//!
//! A reshaper needs the whole word to see cluster boundaries, so it is only
//! ever invoked with a complete intermediate string, never incrementally.

pub mod bengali;

/// Reorders an intermediate glyph string into its final Unicode form.
///
/// Implementations must be pure: the same input always yields the same
/// output, with no side effects.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptReshaper: Send + Sync {
    fn reshape(&self, intermediate: &str) -> String;
}

/// A reshaper that returns its input unchanged.
///
/// Useful for tables whose values are already in logical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReshaper;

impl ScriptReshaper for IdentityReshaper {
    fn reshape(&self, intermediate: &str) -> String {
        intermediate.to_string()
    }
}
