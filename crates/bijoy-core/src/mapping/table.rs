//! The legacy key sequence → glyph fragment table.
//!
//! # Resource format
//!
//! Tables are JSON documents in the Bijoy "parsed layout" shape:
//!
//! ```json
//! {
//!   "name": "Bijoy Classic",
//!   "map": {
//!     "general": { "j": "ক", "d": "ি", "gf": "আ", "jgN": "ক্ষ" }
//!   }
//! }
//! ```
//!
//! A bare top-level object (`{"j": "ক", ...}`) is also accepted, which keeps
//! hand-written test tables short.
//!
//! Keys are 1 to [`MAX_KEY_LEN`] code units long.  A table with an empty key,
//! an over-long key, or no entries at all is rejected: running the typer
//! with a broken table would silently pass every keystroke through.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Longest key sequence, in code units, that a table may contain.
pub const MAX_KEY_LEN: usize = 3;

/// The Bijoy Classic layout shipped inside the binary.
const BIJOY_CLASSIC_JSON: &str = include_str!("../../data/bijoy_classic.json");

/// Error type for loading a mapping table.
///
/// Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum TableError {
    /// The table file could not be read.
    #[error("I/O error reading mapping table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content is not a valid table document.
    #[error("failed to parse mapping table JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A key is empty or longer than [`MAX_KEY_LEN`] code units.
    #[error("mapping key {key:?} has {len} code units (expected 1..={MAX_KEY_LEN})")]
    InvalidKeyLength { key: String, len: usize },

    /// The table has no entries.
    #[error("mapping table contains no entries")]
    Empty,
}

// ── On-disk document shapes ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum TableDocument {
    Layout {
        #[serde(default)]
        name: Option<String>,
        map: LayoutSections,
    },
    Flat(HashMap<String, String>),
}

#[derive(Deserialize)]
struct LayoutSections {
    general: HashMap<String, String>,
}

// ── MappingTable ──────────────────────────────────────────────────────────────

/// Immutable mapping from legacy key sequences to intermediate glyph strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    name: String,
    entries: HashMap<String, String>,
}

impl MappingTable {
    /// Returns the built-in Bijoy Classic table.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded resource is corrupt, which the test suite
    /// guards against.
    pub fn bijoy_classic() -> Result<Self, TableError> {
        Self::from_json_str(BIJOY_CLASSIC_JSON)
    }

    /// Parses a table from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Parse`] for malformed JSON and
    /// [`TableError::InvalidKeyLength`] / [`TableError::Empty`] for tables
    /// that violate the key rules.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let (name, entries) = match serde_json::from_str::<TableDocument>(json)? {
            TableDocument::Layout { name, map } => {
                (name.unwrap_or_else(|| "unnamed".to_string()), map.general)
            }
            TableDocument::Flat(entries) => ("unnamed".to_string(), entries),
        };
        Self::from_entries(name, entries)
    }

    /// Reads and parses a table file.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`MappingTable::from_json_str`].
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), entries = table.len(), "mapping table loaded");
        Ok(table)
    }

    /// Builds a table from `(key, value)` pairs.
    ///
    /// Later duplicates overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Same key rules as [`MappingTable::from_json_str`].
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, TableError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_entries("unnamed".to_string(), entries)
    }

    fn from_entries(name: String, entries: HashMap<String, String>) -> Result<Self, TableError> {
        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        if let Some(bad) = entries.keys().find(|k| !(1..=MAX_KEY_LEN).contains(&k.chars().count())) {
            return Err(TableError::InvalidKeyLength {
                key: bad.clone(),
                len: bad.chars().count(),
            });
        }
        Ok(Self { name, entries })
    }

    /// Looks up the intermediate value for an exact key sequence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Human-readable layout name from the resource (`"unnamed"` if absent).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of key sequences in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a successfully loaded table.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
