//! # ESC Telemetry
//!
//! Collect OpenYGE ESC telemetry from multiple serial channels and report it
//! as CSV.
//!
//! ```bash
//! esc-telemetry [config.toml]
//! ```
//!
//! Without a config path the built-in defaults are used (two channels on
//! `/dev/ttyUSB0` and `/dev/ttyUSB1` at 115200 baud).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use esc_telemetry::config::{Config, LoggingConfig, ReportConfig, SessionConfig};
use esc_telemetry::serial::run_channel;
use esc_telemetry::status::indicator::LogIndicator;
use esc_telemetry::status::run_status_loop;
use esc_telemetry::telemetry::logger::SessionLogger;
use esc_telemetry::telemetry::report::{csv_header, report_rows};
use esc_telemetry::telemetry::store::TelemetryStore;

/// Log file name inside `logging.dir`
const LOG_FILE_NAME: &str = "esc-telemetry.log";

/// Main entry point
///
/// # Control Flow
///
/// 1. Load configuration and set up logging (stderr, optional rolling file)
/// 2. Spawn one reader task per channel, the reporter and the status loop;
///    they only share the telemetry store
/// 3. Run until Ctrl+C
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    let _log_guards = init_logging(&config.logging);

    info!("ESC telemetry v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("{} channel(s) configured", config.channels.len());

    let store = Arc::new(TelemetryStore::new());

    for channel in config.channels.iter().cloned() {
        tokio::spawn(run_channel(channel, config.serial.clone(), Arc::clone(&store)));
    }

    let session = if config.session.enabled {
        Some(open_session(&config.session)?)
    } else {
        None
    };
    tokio::spawn(run_report_loop(Arc::clone(&store), config.report.clone(), session));

    let status_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut indicator = LogIndicator::new();
        run_status_loop(status_store, &mut indicator).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    Ok(())
}

/// Set up the tracing subscriber
///
/// Level comes from `RUST_LOG` if set, else from the config. The returned
/// guards must live until exit so buffered log lines get flushed.
fn init_logging(config: &LoggingConfig) -> Vec<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout is reserved for report rows
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    let mut guards = vec![stderr_guard];

    let file_layer = config.dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
        let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
        guards.push(file_guard);
        fmt::layer().with_writer(file_writer).with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr_writer))
        .with(file_layer)
        .init();

    guards
}

fn open_session(config: &SessionConfig) -> Result<SessionLogger> {
    SessionLogger::new(config).context("Failed to start session recording")
}

/// Periodically scan the store and emit report rows
async fn run_report_loop(store: Arc<TelemetryStore>, config: ReportConfig, mut session: Option<SessionLogger>) {
    let mut stdout = tokio::io::stdout();
    let mut ticker = interval(Duration::from_millis(config.interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if config.stdout {
        if let Err(e) = write_line(&mut stdout, &csv_header()).await {
            warn!("Failed to write report header: {}", e);
        }
    }

    loop {
        ticker.tick().await;

        let rows = report_rows(&store.snapshot_all(), store.now_ms());

        if config.stdout {
            let text: String = rows.iter().map(|row| row.to_csv() + "\n").collect();
            if let Err(e) = write_line(&mut stdout, text.trim_end()).await {
                warn!("Failed to write report: {}", e);
            }
        }

        if let Some(logger) = session.as_mut() {
            if let Err(e) = logger.write_rows(&rows) {
                warn!("Failed to record session rows: {}", e);
            }
        }
    }
}

async fn write_line(stdout: &mut tokio::io::Stdout, text: &str) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
