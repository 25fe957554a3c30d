//! The correction planner: a minimal edit from the typed word to its
//! converted form.
//!
//! By the time a plan is computed the user has already typed the word *and*
//! the space after it, so every non-empty plan also deletes (and the replay
//! later re-types) that trailing space.
//!
//! # Rules (first match wins)
//!
//! 1. **Script change** – the typed word is pure ASCII and the converted word
//!    contains anything outside ASCII: delete the whole word plus the space
//!    and type the converted word.
//! 2. **Unchanged** – the converted word equals the typed word: do nothing.
//! 3. **Suffix edit** – keep the longest common prefix and replace the rest.
//!
//! Rule 1 wins over rule 3 even when the two words share a literal prefix.
//! All lengths are counted in code points, never bytes.

/// What the replay must do to the live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionPlan {
    /// Leave the document untouched.
    NoOp,
    /// Delete `delete_count` characters before the cursor, then type
    /// `insert_text` (and re-type the boundary).
    Replace {
        delete_count: usize,
        insert_text: String,
    },
}

impl CorrectionPlan {
    /// Returns `true` for [`CorrectionPlan::NoOp`].
    pub fn is_noop(&self) -> bool {
        matches!(self, CorrectionPlan::NoOp)
    }

    /// Number of backward deletions (zero for `NoOp`).
    pub fn delete_count(&self) -> usize {
        match self {
            CorrectionPlan::NoOp => 0,
            CorrectionPlan::Replace { delete_count, .. } => *delete_count,
        }
    }

    /// Text to insert (empty for `NoOp`).
    pub fn insert_text(&self) -> &str {
        match self {
            CorrectionPlan::NoOp => "",
            CorrectionPlan::Replace { insert_text, .. } => insert_text,
        }
    }
}

fn is_ascii_only(text: &str) -> bool {
    text.chars().all(|c| (c as u32) < 128)
}

/// Computes the edit that turns the typed `original` (already followed by a
/// committed boundary) into `converted`.
pub fn plan(original: &str, converted: &str) -> CorrectionPlan {
    if is_ascii_only(original) && !is_ascii_only(converted) {
        return CorrectionPlan::Replace {
            delete_count: original.chars().count() + 1,
            insert_text: converted.to_string(),
        };
    }

    if original == converted {
        return CorrectionPlan::NoOp;
    }

    let prefix = original
        .chars()
        .zip(converted.chars())
        .take_while(|(a, b)| a == b)
        .count();
    CorrectionPlan::Replace {
        delete_count: original.chars().count() - prefix + 1,
        insert_text: converted.chars().skip(prefix).collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
