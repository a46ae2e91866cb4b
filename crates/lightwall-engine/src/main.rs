//! Lightwall engine entry point.
//!
//! Loads the configuration, builds the device registry, starts the pipeline
//! threads and waits for Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ log_subscriber()           -- RUST_LOG, else --log-level, else info
//!  └─ load_config_from()         -- TOML file or defaults
//!  └─ reload log filter          -- now honours [engine] log_level
//!  └─ builtin_programs()         -- cross / wash / random / off
//!  └─ build_registry()           -- one driver per [[devices]] entry
//!  └─ spawn_pipeline()
//!       ├─ "trigger"          thread (timer source only)
//!       ├─ "frame-generator"  thread
//!       └─ "frame-writer"     thread
//!  └─ spawn_console()            -- stdin commands
//!  └─ wait for Ctrl-C, `quit`, or a stage to exit
//! ```
//!
//! # Why tokio here? (for beginners)
//!
//! The pipeline itself runs on plain OS threads because each stage spends its
//! life blocked on a condition variable.  Tokio is only used in `main` for
//! portable Ctrl-C handling and the 100 ms supervision loop.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use lightwall_core::effects::builtin_programs;
use lightwall_engine::application::build_registry::build_registry;
use lightwall_engine::application::pipeline::spawn_pipeline;
use lightwall_engine::application::select_mode::ModeSelector;
use lightwall_engine::infrastructure::console::spawn_console;
use lightwall_engine::infrastructure::devices::BuiltinDeviceFactory;
use lightwall_engine::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Lightwall: drive several LED grids as one animated canvas.
#[derive(Debug, Parser)]
#[command(
    name = "lightwall",
    about = "Animates several pixel-grid devices as one logical canvas",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Defaults to `lightwall/config.toml` in the platform config directory.
    #[arg(long, env = "LIGHTWALL_CONFIG")]
    config: Option<PathBuf>,

    /// Program to run at start-up; overrides `[engine] mode`.
    #[arg(long, env = "LIGHTWALL_MODE")]
    mode: Option<String>,

    /// Log filter used when `RUST_LOG` is unset; overrides `[engine] log_level`.
    #[arg(long, env = "LIGHTWALL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Do not read commands from standard input.
    #[arg(long)]
    no_console: bool,

    /// Write a starter configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config directory"),
        }
    }

    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(mode) = &self.mode {
            config.engine.mode = mode.clone();
        }
        if let Some(level) = &self.log_level {
            config.engine.log_level = level.clone();
        }
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Level used until the configuration file has been read.
fn startup_log_level(cli: &Cli) -> &str {
    cli.log_level.as_deref().unwrap_or("info")
}

/// Builds the fmt subscriber behind a reloadable filter.
///
/// Installed before the config file is read; the returned handle swaps in the
/// configured filter afterwards.
fn log_subscriber<W>(
    filter: EnvFilter,
    writer: W,
) -> (
    impl Subscriber + Send + Sync + 'static,
    reload::Handle<EnvFilter, Registry>,
)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_thread_names(true).with_writer(writer));
    (subscriber, handle)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the CLI level until the config is loaded.
    // Thread names tell the pipeline stages apart.
    let rust_log = EnvFilter::try_from_default_env().ok();
    let has_rust_log = rust_log.is_some();
    let initial = rust_log.unwrap_or_else(|| EnvFilter::new(startup_log_level(&cli)));
    let (subscriber, log_filter) = log_subscriber(initial, std::io::stdout);
    subscriber.init();

    let config_path = cli.config_path()?;

    if cli.init_config {
        save_config_to(&config_path, &AppConfig::sample())
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote starter configuration to {}", config_path.display());
        return Ok(());
    }

    let mut config = load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply_overrides(&mut config);
    if !has_rust_log {
        log_filter
            .reload(EnvFilter::new(&config.engine.log_level))
            .context("applying configured log level")?;
    }

    info!("Lightwall engine starting with {}", config_path.display());

    // ── Programs, trigger and devices ─────────────────────────────────────────
    let programs = builtin_programs(&config.effect_options()).context("registering programs")?;
    let modes = Arc::new(ModeSelector::new(&programs, &config.engine.mode)?);
    let source = config.trigger_source()?;

    let registry = build_registry(&config.device_declarations(), &BuiltinDeviceFactory)?;
    if registry.is_empty() {
        anyhow::bail!(
            "no usable device in {}; run `lightwall --init-config` for a starter file",
            config_path.display()
        );
    }
    info!(
        "{} device(s) on a {} canvas",
        registry.len(),
        registry.canvas_size()
    );

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let pipeline = spawn_pipeline(Arc::new(registry), programs, modes, source)?;
    if !cli.no_console {
        spawn_console(pipeline.control()).context("starting console")?;
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    while running.load(Ordering::Relaxed) && !pipeline.is_finished() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    pipeline.stop().context("pipeline stopped with an error")?;
    info!("Lightwall engine stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
