//! TOML-based configuration for the typer.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\BijoyTyper\config.toml`
//! - Linux:    `~/.config/bijoy-typer/config.toml`
//! - macOS:    `~/Library/Application Support/BijoyTyper/config.toml`
//!
//! A different file can be passed with `--config`.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! start_active = true
//! toggle_key = "F12"
//!
//! [mapping]
//! table_path = "/home/me/layouts/bijoy_custom.json"
//!
//! [replay]
//! backspace_delay_ms = 15
//!
//! [injection]
//! strategies = ["clipboard", "per-char"]
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, and every section is
//! optional, so an empty file (or no file at all) yields the defaults and
//! older files keep working when new fields are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::capture::DEFAULT_MAX_WORD_LEN;
use crate::application::replay::ReplayTiming;
use crate::infrastructure::output_injection::StrategyKind;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
}

/// Capture behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Whether transliteration is on at startup.
    #[serde(default)]
    pub start_active: bool,
    /// Hotkey that toggles transliteration (`"F1"`..`"F12"`, `"ScrollLock"`,
    /// `"Pause"`, `"Insert"`).
    #[serde(default = "default_toggle_key")]
    pub toggle_key: String,
    /// Longest word buffered before the buffer is discarded.
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which reshaper post-processes mapped text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReshaperKind {
    /// Bijoy visual-order fix-ups.
    #[default]
    Bengali,
    /// Leave mapped text as is.
    Identity,
}

/// Mapping table selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MappingConfig {
    /// JSON layout file replacing the built-in Bijoy Classic table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_path: Option<PathBuf>,
    #[serde(default)]
    pub reshaper: ReshaperKind,
}

/// Replay pacing, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_backspace_delay_ms")]
    pub backspace_delay_ms: u64,
    #[serde(default = "default_step_delay_ms")]
    pub pre_insert_delay_ms: u64,
    #[serde(default = "default_step_delay_ms")]
    pub pre_boundary_delay_ms: u64,
    #[serde(default = "default_post_replay_delay_ms")]
    pub post_replay_delay_ms: u64,
    #[serde(default = "default_clipboard_restore_delay_ms")]
    pub clipboard_restore_delay_ms: u64,
}

/// Text insertion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectionConfig {
    /// Strategies tried in order until one succeeds.
    #[serde(default = "StrategyKind::default_chain")]
    pub strategies: Vec<StrategyKind>,
    /// Pause between code points for the `per-char` strategy.
    #[serde(default = "default_char_delay_ms")]
    pub char_delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_toggle_key() -> String {
    "F12".to_string()
}
fn default_max_word_len() -> usize {
    DEFAULT_MAX_WORD_LEN
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_settle_delay_ms() -> u64 {
    100
}
fn default_backspace_delay_ms() -> u64 {
    10
}
fn default_step_delay_ms() -> u64 {
    50
}
fn default_post_replay_delay_ms() -> u64 {
    100
}
fn default_clipboard_restore_delay_ms() -> u64 {
    500
}
fn default_char_delay_ms() -> u64 {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_active: false,
            toggle_key: default_toggle_key(),
            max_word_len: default_max_word_len(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            backspace_delay_ms: default_backspace_delay_ms(),
            pre_insert_delay_ms: default_step_delay_ms(),
            pre_boundary_delay_ms: default_step_delay_ms(),
            post_replay_delay_ms: default_post_replay_delay_ms(),
            clipboard_restore_delay_ms: default_clipboard_restore_delay_ms(),
        }
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::default_chain(),
            char_delay_ms: default_char_delay_ms(),
        }
    }
}

impl ReplayConfig {
    /// Converts the millisecond settings into replay pauses.
    pub fn timing(&self) -> ReplayTiming {
        ReplayTiming {
            settle: Duration::from_millis(self.settle_delay_ms),
            backspace: Duration::from_millis(self.backspace_delay_ms),
            pre_insert: Duration::from_millis(self.pre_insert_delay_ms),
            pre_boundary: Duration::from_millis(self.pre_boundary_delay_ms),
            post_replay: Duration::from_millis(self.post_replay_delay_ms),
            clipboard_restore: Duration::from_millis(self.clipboard_restore_delay_ms),
        }
    }
}

impl InjectionConfig {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Loads `AppConfig` from the default location.
///
/// # Errors
///
/// See [`config_file_path`] and [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory, including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("BijoyTyper"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("bijoy-typer"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("BijoyTyper")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
