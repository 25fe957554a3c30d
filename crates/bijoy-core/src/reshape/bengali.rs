//! Bengali reshaper for Bijoy-ordered glyph strings.
//!
//! Bijoy is typed the way the word *looks*, not the way Unicode stores it:
//!
//! | Typed (visual)         | Unicode (logical)      |
//! |------------------------|------------------------|
//! | `ি` `ক`                | `ক` `ি`   (কি)          |
//! | `ে` `ক` `্` `র`         | `ক` `্` `র` `ে` (ক্রে)   |
//! | `ে` `ক` `া`             | `ক` `ো`   (কো)          |
//! | `ক` `র` `্`             | `র` `্` `ক` (র্ক)        |
//!
//! Two passes run over the whole word:
//!
//! 1. **Pre-base vowel signs** (`ি`, `ে`, `ৈ`) that precede a consonant
//!    cluster move to just after it.  A cluster is a consonant followed by any
//!    number of hasanta + consonant links.  `ে` … `া` and `ে` … `ৗ` fuse into
//!    `ো` and `ৌ`.
//! 2. **Reph** (`র্`) typed after a cluster and its vowel signs, and not itself
//!    followed by a consonant, moves in front of that cluster.
//!
//! A reph in the middle of a word (`ক` `ম` `র্` `ত`) stays where it is.  By
//! the time the reshaper runs, a reph key and a `র` + hasanta typed before a
//! consonant are the same code points, and the latter is already in logical
//! order.  Words with an inner reph have to be typed in logical order.
//!
//! Anything the passes do not recognise is left exactly where it was.

use super::ScriptReshaper;

const HASANTA: char = '\u{09CD}';
const RA: char = '\u{09B0}';
const I_KAR: char = '\u{09BF}';
const E_KAR: char = '\u{09C7}';
const OI_KAR: char = '\u{09C8}';
const AA_KAR: char = '\u{09BE}';
const O_KAR: char = '\u{09CB}';
const AU_KAR: char = '\u{09CC}';
const AU_LENGTH_MARK: char = '\u{09D7}';

fn is_consonant(c: char) -> bool {
    matches!(c, '\u{0995}'..='\u{09B9}' | '\u{09DC}' | '\u{09DD}' | '\u{09DF}')
}

fn is_pre_base(c: char) -> bool {
    matches!(c, I_KAR | E_KAR | OI_KAR)
}

fn is_vowel_sign(c: char) -> bool {
    matches!(c, '\u{09BE}'..='\u{09CC}' | AU_LENGTH_MARK)
}

/// Returns the exclusive end of the cluster starting at `start`.
///
/// `chars[start]` must be a consonant.
fn cluster_end(chars: &[char], start: usize) -> usize {
    let mut end = start + 1;
    while end + 1 < chars.len() && chars[end] == HASANTA && is_consonant(chars[end + 1]) {
        end += 2;
    }
    end
}

/// Returns where the cluster ending at the tail of `out` starts, skipping
/// trailing vowel signs.  `None` if `out` does not end in a cluster.
fn trailing_cluster_start(out: &[char]) -> Option<usize> {
    let mut j = out.len();
    while j > 0 && is_vowel_sign(out[j - 1]) {
        j -= 1;
    }
    if j == 0 || !is_consonant(out[j - 1]) {
        return None;
    }
    j -= 1;
    while j >= 2 && out[j - 1] == HASANTA && is_consonant(out[j - 2]) {
        j -= 2;
    }
    Some(j)
}

fn reorder_pre_base(chars: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_pre_base(c) && chars.get(i + 1).copied().is_some_and(is_consonant) {
            let end = cluster_end(chars, i + 1);
            out.extend_from_slice(&chars[i + 1..end]);
            match (c, chars.get(end).copied()) {
                (E_KAR, Some(AA_KAR)) => {
                    out.push(O_KAR);
                    i = end + 1;
                }
                (E_KAR, Some(AU_LENGTH_MARK)) => {
                    out.push(AU_KAR);
                    i = end + 1;
                }
                _ => {
                    out.push(c);
                    i = end;
                }
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

fn place_reph(chars: &[char]) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let is_reph = chars[i] == RA
            && chars.get(i + 1) == Some(&HASANTA)
            && !chars.get(i + 2).copied().is_some_and(is_consonant);
        if is_reph {
            if let Some(start) = trailing_cluster_start(&out) {
                out.splice(start..start, [RA, HASANTA]);
                i += 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Reshaper for the Bijoy Classic table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BengaliReshaper;

impl ScriptReshaper for BengaliReshaper {
    fn reshape(&self, intermediate: &str) -> String {
        let chars: Vec<char> = intermediate.chars().collect();
        let reordered = reorder_pre_base(&chars);
        place_reph(&reordered).into_iter().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
