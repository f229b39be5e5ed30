// src/main.rs
//! Clipboard history recorder
//!
//! Runs in the background, samples the clipboard every poll interval and
//! writes each new unique text value to the history database. Stops cleanly
//! on Ctrl+C or SIGTERM.

#![deny(unsafe_op_in_unsafe_fn)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use clipboard_monitor::config::{expand_home, MonitorConfig};
use clipboard_monitor::core::error::ConfigError;
use clipboard_monitor::listeners::{entry_json, ConsoleLogger, LogFormat};
use clipboard_monitor::platform::system_sources;
use clipboard_monitor::prelude::*;

/// Command line interface for the clipboard monitor
#[derive(Debug, Parser)]
#[command(
    name = "clipboard-monitor",
    version,
    about = "Record clipboard text history into a local SQLite database",
    long_about = "Polls the system clipboard in the background, classifies every new text value (URL, email, dates, numbers, long or short text) and stores each unique value once, with the frontmost application and a timestamp."
)]
struct Args {
    /// Path to the YAML config file
    #[arg(long, help = "Config file (default: ~/.clipboard-monitor/config.yaml)")]
    config: Option<PathBuf>,

    /// Override the database location from the config file
    #[arg(long)]
    database: Option<String>,

    /// Override the polling interval in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,

    /// Output format for captured entries
    #[arg(long, default_value = "human", value_enum)]
    format: OutputFormat,

    /// Do not echo captured entries to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the most recent stored entries and exit
    #[arg(long, value_name = "N")]
    list: Option<usize>,

    /// Print the number of stored entries and exit
    #[arg(long)]
    count: bool,

    /// Check clipboard and database access and exit
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// One JSON object per line
    Json,
}

impl From<OutputFormat> for LogFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => LogFormat::Human,
            OutputFormat::Json => LogFormat::Json,
        }
    }
}

/// The main application state
struct MonitorApp {
    args: Args,
    config: MonitorConfig,
    start_time: Instant,
}

impl MonitorApp {
    fn new(args: Args) -> Result<Self> {
        let start_time = Instant::now();

        let config_path = args.config.clone().unwrap_or_else(MonitorConfig::default_path);
        let (mut config, config_error) = MonitorConfig::load_or_default(&config_path);

        Self::setup_logging(&args, &config)?;

        match config_error {
            None => debug!("Loaded config from {}", config_path.display()),
            Some(ConfigError::NotFound(path)) => {
                debug!("No config file at {}, using defaults", path.display())
            }
            Some(e) => warn!("⚠️  {:#} - using defaults", anyhow::Error::new(e)),
        }

        if let Some(database) = &args.database {
            config.database_path = expand_home(database);
        }
        if let Some(ms) = args.interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }

        debug!("Configuration: {:#?}", config);

        Ok(Self {
            args,
            config,
            start_time,
        })
    }

    async fn run(self) -> Result<()> {
        if self.args.check {
            return self.check().await;
        }

        if self.args.count || self.args.list.is_some() {
            let store = EntryStore::open(&self.config.database_path)
                .await
                .context("Failed to open clipboard database")?;
            if self.args.count {
                println!("{}", store.count().await?);
            } else if let Some(limit) = self.args.list {
                self.list(&store, limit).await?;
            }
            store.close().await;
            return Ok(());
        }

        self.monitor().await
    }

    /// Run the monitor until a termination signal arrives
    async fn monitor(&self) -> Result<()> {
        let (clipboard, foreground) = system_sources()?;

        // An unavailable database is reopened on the next captured change.
        let mut store = LazyStore::new(&self.config.database_path);
        if let Err(e) = store.get().await {
            error!(
                "❌ Clipboard database unavailable, retrying on the next change: {:#}",
                anyhow::Error::new(e)
            );
        }

        info!(
            "🚀 Starting Clipboard Monitor v{} (database: {})",
            env!("CARGO_PKG_VERSION"),
            self.config.database_path.display()
        );

        let classifier =
            Classifier::default().with_min_language_chars(self.config.min_language_chars);
        let mut monitor = ClipboardMonitor::new(clipboard, foreground, store)
            .with_classifier(classifier)
            .with_interval(self.config.poll_interval);

        if !self.args.quiet {
            monitor.add_listener(ConsoleLogger::new(self.args.format.into()));
        }

        let handle = monitor.start();
        info!("👀 Monitoring started. Press Ctrl+C to stop gracefully.");

        let shutdown = handle.shutdown_token();
        tokio::spawn(async move {
            match wait_for_shutdown_signal().await {
                Ok(()) => info!("🛑 Termination signal received"),
                Err(e) => error!("❌ Signal handler failed: {}", e),
            }
            shutdown.cancel();
        });

        let stats = handle.join().await.context("Monitor loop terminated abnormally")?;

        info!(
            "📊 Session completed. Runtime: {:.2}s, {} new entries",
            self.start_time.elapsed().as_secs_f64(),
            stats.stored
        );
        Ok(())
    }

    async fn list(&self, store: &EntryStore, limit: usize) -> Result<()> {
        for stored in store.recent(limit).await? {
            match self.args.format {
                OutputFormat::Json => {
                    let mut value = entry_json(&stored.entry);
                    value["id"] = stored.id.into();
                    println!("{}", value);
                }
                OutputFormat::Human => {
                    println!(
                        "{:>6}  {}  {:<18}  {}",
                        stored.id,
                        stored.entry.captured_at.format("%Y-%m-%d %H:%M:%S"),
                        stored.entry.content_type,
                        clipboard_monitor::listeners::safe_truncate(
                            &stored.entry.content.replace('\n', " "),
                            60
                        )
                    );
                }
            }
        }
        Ok(())
    }

    /// Check clipboard and database access and report
    async fn check(&self) -> Result<()> {
        println!("🔐 Checking clipboard monitor prerequisites...\n");

        match system_sources() {
            Ok((clipboard, foreground)) => {
                println!("✅ Clipboard: change token = {}", clipboard.change_token());
                match foreground.foreground_app() {
                    Some(app) => println!("✅ Foreground app: {}", app),
                    None => println!("⚠️  Foreground app: unavailable"),
                }
            }
            Err(e) => println!("❌ Clipboard: {}", e),
        }

        match EntryStore::open(&self.config.database_path).await {
            Ok(store) => {
                println!(
                    "✅ Database: {} ({} entries)",
                    store.path().display(),
                    store.count().await?
                );
                store.close().await;
            }
            Err(e) => println!("❌ Database: {:#}", anyhow::Error::new(e)),
        }

        Ok(())
    }

    /// Set up logging based on verbosity level
    fn setup_logging(args: &Args, config: &MonitorConfig) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let level = match args.verbose {
            0 => config.log_level.as_deref().unwrap_or("info"),
            1 => "debug",
            _ => "trace",
        };

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_target(args.verbose > 1)
            .with_thread_ids(args.verbose > 2)
            .init();

        Ok(())
    }
}

/// Resolve when Ctrl+C or SIGTERM is received
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let app = MonitorApp::new(args).context("Failed to initialize clipboard monitor")?;
    app.run().await.context("Application runtime error")?;

    Ok(())
}
