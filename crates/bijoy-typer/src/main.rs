//! bijoy-typer entry point.
//!
//! Watches the keyboard system-wide and, while active, rewrites every word
//! typed on the Bijoy layout as Unicode Bengali the moment the space bar is
//! pressed.
//!
//! # Usage
//!
//! ```text
//! bijoy-typer [OPTIONS] [COMMAND]
//!
//! Commands:
//!   run       Start the live typer (default)
//!   convert   Transliterate the given text and print it
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --table <PATH>       JSON mapping table replacing the built-in one
//!   --active             Start with transliteration switched on
//!   --log-level <LEVEL>  Overrides `[engine] log_level`
//! ```
//!
//! # Architecture overview
//!
//! ```text
//! main()
//!  ├─ load config (TOML) and mapping table (JSON)
//!  ├─ RdevInputSource      (global hook thread)   ──mpsc──┐
//!  ├─ event pump           (dedicated thread)     ◀───────┘
//!  │    └─ CorrectWordUseCase::handle_event
//!  │         └─ one Tokio task per completed word ─▶ StrategyChainInjector
//!  └─ wait for Ctrl-C
//! ```

use std::path::PathBuf;

use anyhow::Context;
use bijoy_core::Transliterator;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bijoy_typer::infrastructure::storage::{
    config::{self, AppConfig},
    layout,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Live Bijoy-to-Unicode Bengali typer.
#[derive(Debug, Parser)]
#[command(
    name = "bijoy-typer",
    about = "Type Bengali with the Bijoy layout in any application",
    version
)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, env = "BIJOY_TYPER_CONFIG")]
    config: Option<PathBuf>,

    /// JSON mapping table to use instead of the built-in Bijoy Classic table.
    #[arg(long, env = "BIJOY_TYPER_TABLE")]
    table: Option<PathBuf>,

    /// Start with transliteration switched on.
    #[arg(long)]
    active: bool,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).  `RUST_LOG`
    /// takes precedence when set.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Start the live typer.
    Run,
    /// Transliterate TEXT word by word and print the result.
    Convert {
        /// Text typed on the Bijoy layout.
        #[arg(required = true)]
        text: Vec<String>,
    },
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => config::load_config().context("failed to load config")?,
        };
        if self.active {
            cfg.engine.start_active = true;
        }
        if let Some(level) = &self.log_level {
            cfg.engine.log_level = level.clone();
        }
        Ok(cfg)
    }
}

/// Converts each space-separated word on its own, the way the live typer
/// sees them.
fn convert_words(transliterator: &Transliterator, text: &[String]) -> String {
    text.join(" ")
        .split(' ')
        .map(|word| transliterator.transliterate(word))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Live mode ─────────────────────────────────────────────────────────────────

#[cfg(feature = "desktop")]
async fn run(cfg: AppConfig, transliterator: Transliterator) -> anyhow::Result<()> {
    use std::sync::Arc;

    use bijoy_typer::application::{
        capture::CaptureStateMachine, correct_word::CorrectWordUseCase, replay::ReplayCoordinator,
    };
    use bijoy_typer::infrastructure::input_capture::{desktop::RdevInputSource, InputSource};
    use bijoy_typer::infrastructure::output_injection::{
        desktop::{ArboardClipboard, EnigoKeySynthesizer},
        StrategyChainInjector,
    };

    let injector = StrategyChainInjector::from_kinds(
        &cfg.injection.strategies,
        Arc::new(EnigoKeySynthesizer::new()),
        Arc::new(ArboardClipboard::new().context("failed to open the clipboard")?),
        cfg.injection.char_delay(),
    );
    info!(strategies = ?injector.strategy_names(), "output injection ready");

    let use_case = Arc::new(CorrectWordUseCase::new(
        CaptureStateMachine::new(cfg.engine.start_active, cfg.engine.max_word_len),
        transliterator,
        ReplayCoordinator::new(Arc::new(injector), cfg.replay.timing()),
        tokio::runtime::Handle::current(),
    ));

    let source = RdevInputSource::new(&cfg.engine.toggle_key)?;
    let events = source.start()?;

    let pump_use_case = Arc::clone(&use_case);
    std::thread::Builder::new()
        .name("event-pump".into())
        .spawn(move || pump_use_case.run_pump(events))
        .context("failed to start event pump")?;

    info!(
        "bijoy-typer ready ({}).  Press {} to toggle, Ctrl-C to exit.",
        if cfg.engine.start_active { "active" } else { "inactive" },
        cfg.engine.toggle_key
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");
    source.stop();
    Ok(())
}

#[cfg(not(feature = "desktop"))]
async fn run(_cfg: AppConfig, _transliterator: Transliterator) -> anyhow::Result<()> {
    anyhow::bail!(
        "live typing needs the keyboard hook; rebuild with `--features desktop` \
         (the `convert` command works without it)"
    )
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    // `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.engine.log_level)),
        )
        .init();

    let transliterator = layout::load_transliterator(&cfg.mapping, cli.table.as_deref())
        .context("failed to load mapping table")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Convert { text } => {
            println!("{}", convert_words(&transliterator, &text));
            Ok(())
        }
        Command::Run => {
            info!("bijoy-typer starting");
            run(cfg, transliterator).await?;
            info!("bijoy-typer stopped");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
