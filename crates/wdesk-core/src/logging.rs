//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "WDESK_LOG";

/// Crates whose events are kept at `info` unless `WDESK_LOG` says otherwise
const SESSION_TARGETS: [&str; 4] = ["wallet_desk", "wdesk_core", "wdesk_ledger", "wdesk_app"];

const LOG_FILE_PREFIX: &str = "wdesk.log";

/// Install the file logger for the session core
///
/// Writes a daily file under `<data dir>/wallet-desk/logs/`; the filter comes
/// from `WDESK_LOG`. Returns the path of today's log file.
///
/// ```bash
/// WDESK_LOG=wdesk_app::session=debug,wdesk_app::broadcast=trace my-wallet-frontend
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let filter = env_filter();
    let directives = filter.to_string();
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(false)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        filter = %directives,
        "wallet session core logging to {}",
        log_dir.display()
    );

    Ok(log_file_path())
}

/// Filter from `WDESK_LOG`, or `info` for the session crates and `warn` elsewhere
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directives()))
}

fn default_directives() -> String {
    let mut directives: Vec<String> = SESSION_TARGETS
        .iter()
        .map(|target| format!("{target}=info"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wallet-desk")
        .join("logs")
}

/// Base path of the rolling log; the appender suffixes it with the date
pub fn log_file_path() -> PathBuf {
    log_directory().join(LOG_FILE_PREFIX)
}
