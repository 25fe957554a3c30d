//! Storage infrastructure: configuration and layout files.
//!
//! - `config` reads the TOML configuration file from the platform-appropriate
//!   directory (or a path given on the command line) and falls back to
//!   defaults when the file does not exist yet.
//! - `layout` loads the mapping table and reshaper the configuration selects.

pub mod config;
pub mod layout;
