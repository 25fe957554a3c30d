//! Loads the keyboard layout selected by the configuration.
//!
//! The built-in Bijoy Classic table is used unless a JSON table file is
//! named, either in `[mapping] table_path` or with `--table` on the command
//! line (which wins).  A table that cannot be read or parsed is fatal.

use std::path::Path;
use std::sync::Arc;

use bijoy_core::{
    BengaliReshaper, IdentityReshaper, MappingTable, ScriptReshaper, TableError, Transliterator,
};
use tracing::info;

use super::config::{MappingConfig, ReshaperKind};

/// Builds the transliterator for `config`, with `table_override` taking
/// precedence over `config.table_path`.
///
/// # Errors
///
/// Returns [`TableError`] if the selected table cannot be loaded.
pub fn load_transliterator(
    config: &MappingConfig,
    table_override: Option<&Path>,
) -> Result<Transliterator, TableError> {
    let table = match table_override.or(config.table_path.as_deref()) {
        Some(path) => MappingTable::from_path(path)?,
        None => MappingTable::bijoy_classic()?,
    };

    let reshaper: Arc<dyn ScriptReshaper> = match config.reshaper {
        ReshaperKind::Bengali => Arc::new(BengaliReshaper),
        ReshaperKind::Identity => Arc::new(IdentityReshaper),
    };

    info!(
        table = table.name(),
        entries = table.len(),
        reshaper = ?config.reshaper,
        "keyboard layout loaded"
    );
    Ok(Transliterator::new(table, reshaper))
}
