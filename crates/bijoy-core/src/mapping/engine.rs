//! Greedy longest-match transliteration.
//!
//! At each cursor position the engine tries the 3-code-unit substring, then
//! 2, then 1.  The first hit is emitted and the cursor jumps past it.  If no
//! length hits, the code unit itself is emitted unchanged and the cursor
//! advances by one.
//!
//! The match is never backtracked.  With a table containing `"iga"`, `"ga"`
//! and `"i"`, the input `"iga"` always yields the `"iga"` value even if
//! `"i"` + `"ga"` would read better.  That mirrors how Bijoy typists learn
//! the layout, so the behaviour is kept exactly.

use std::sync::Arc;

use super::table::{MappingTable, MAX_KEY_LEN};
use crate::reshape::ScriptReshaper;

/// How a [`Segment`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// The source matched a table key.
    Mapped,
    /// No key matched; the single source code unit is passed through.
    Passthrough,
}

/// One step of the greedy scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// The consumed slice of the input.
    pub source: &'a str,
    /// The emitted fragment (equal to `source` for pass-through).
    pub output: &'a str,
    pub kind: SegmentKind,
}

/// Converts typed legacy key sequences to final Unicode text.
///
/// Cheap to clone; the table and reshaper are shared.
#[derive(Clone)]
pub struct Transliterator {
    table: Arc<MappingTable>,
    reshaper: Arc<dyn ScriptReshaper>,
}

impl std::fmt::Debug for Transliterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transliterator")
            .field("table", &self.table.name())
            .field("entries", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Transliterator {
    /// Creates a transliterator over `table` that hands its output to `reshaper`.
    pub fn new(table: MappingTable, reshaper: Arc<dyn ScriptReshaper>) -> Self {
        Self {
            table: Arc::new(table),
            reshaper,
        }
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Splits `raw` into the segments the greedy scan consumes.
    ///
    /// Concatenating every `source` reproduces `raw` exactly.
    pub fn segments<'a>(&'a self, raw: &'a str) -> Vec<Segment<'a>> {
        // Byte offset of every char boundary, including the end of the string.
        let bounds: Vec<usize> = raw
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(raw.len()))
            .collect();
        let char_count = bounds.len() - 1;

        let mut segments = Vec::with_capacity(char_count);
        let mut i = 0;
        while i < char_count {
            let longest = MAX_KEY_LEN.min(char_count - i);
            let hit = (1..=longest).rev().find_map(|len| {
                let key = &raw[bounds[i]..bounds[i + len]];
                self.table.get(key).map(|value| (len, key, value))
            });

            match hit {
                Some((len, key, value)) => {
                    segments.push(Segment {
                        source: key,
                        output: value,
                        kind: SegmentKind::Mapped,
                    });
                    i += len;
                }
                None => {
                    let unit = &raw[bounds[i]..bounds[i + 1]];
                    segments.push(Segment {
                        source: unit,
                        output: unit,
                        kind: SegmentKind::Passthrough,
                    });
                    i += 1;
                }
            }
        }
        segments
    }

    /// Runs the greedy pass only and returns the intermediate glyph string.
    pub fn map_keys(&self, raw: &str) -> String {
        self.segments(raw).iter().map(|s| s.output).collect()
    }

    /// Converts a complete typed word to its final Unicode form.
    ///
    /// The reshaper always sees the whole intermediate string at once.
    pub fn transliterate(&self, raw: &str) -> String {
        let intermediate = self.map_keys(raw);
        let converted = self.reshaper.reshape(&intermediate);
        tracing::trace!(%raw, %intermediate, %converted, "transliterated");
        converted
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::{IdentityReshaper, MockScriptReshaper};

    fn identity(pairs: &[(&str, &str)]) -> Transliterator {
        let table = MappingTable::from_pairs(pairs.iter().copied()).unwrap();
        Transliterator::new(table, Arc::new(IdentityReshaper))
    }

    #[test]
    fn test_longest_key_wins_over_shorter_prefixes() {
        let t = identity(&[("abc", "3"), ("ab", "2"), ("a", "1"), ("c", "C")]);
        assert_eq!(t.map_keys("abcX"), "3X");
    }

    #[test]
    fn test_two_unit_key_used_when_three_is_absent() {
        let t = identity(&[("ab", "2"), ("a", "1")]);
        assert_eq!(t.map_keys("abab"), "22");
    }

    #[test]
    fn test_greedy_match_is_not_backtracked() {
        // "xy" is taken greedily, leaving "z" unmatched, even though
        // "x" + "yz" would have matched everything.
        let t = identity(&[("xy", "A"), ("yz", "B"), ("x", "C")]);
        assert_eq!(t.map_keys("xyz"), "Az");
    }

    #[test]
    fn test_unmapped_units_pass_through_unchanged() {
        let t = identity(&[("k", "ক")]);
        assert_eq!(t.map_keys("k.!k"), "ক.!ক");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let t = identity(&[("k", "ক")]);
        assert_eq!(t.map_keys(""), "");
        assert!(t.segments("").is_empty());
    }

    #[test]
    fn test_segments_consume_entire_input() {
        // Arrange
        let t = identity(&[("abc", "3"), ("ab", "2"), ("q", "Q")]);
        let raw = "zabcqabq!ab";

        // Act
        let segments = t.segments(raw);

        // Assert
        let rebuilt: String = segments.iter().map(|s| s.source).collect();
        assert_eq!(rebuilt, raw);
        let passthrough = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Passthrough)
            .count();
        assert_eq!(passthrough, 2, "only 'z' and '!' are unmapped");
    }

    #[test]
    fn test_lookahead_is_clamped_at_end_of_input() {
        let t = identity(&[("abc", "3"), ("a", "1")]);
        // Only two units remain, so the 3-unit key must not be attempted.
        assert_eq!(t.map_keys("ab"), "1b");
    }

    #[test]
    fn test_non_ascii_input_is_handled_per_code_point() {
        let t = identity(&[("ক", "k")]);
        assert_eq!(t.map_keys("কখ"), "kখ");
    }

    #[test]
    fn test_same_input_gives_same_output() {
        let t = Transliterator::new(
            MappingTable::bijoy_classic().unwrap(),
            Arc::new(crate::BengaliReshaper),
        );
        assert_eq!(t.transliterate("dj"), t.transliterate("dj"));
    }

    #[test]
    fn test_reshaper_receives_full_intermediate_once() {
        // Arrange
        let mut reshaper = MockScriptReshaper::new();
        reshaper
            .expect_reshape()
            .withf(|s: &str| s == "XY")
            .times(1)
            .returning(|s| format!("<{s}>"));
        let table = MappingTable::from_pairs([("k", "X"), ("i", "Y")]).unwrap();
        let t = Transliterator::new(table, Arc::new(reshaper));

        // Act
        let out = t.transliterate("ki");

        // Assert
        assert_eq!(out, "<XY>");
    }
}
