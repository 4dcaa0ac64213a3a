//! Logging setup for `lleh` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `LLEH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`
//!
//! Logs are sent to STDERR so they never mix with command output on stdout.

use anyhow::{Result, bail};
use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable consulted when no level is given on the command line.
pub const LOG_ENV_VAR: &str = "LLEH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup. An unknown level on the command line is an
/// error; an unknown value in the environment falls back to the default.
pub fn init_logging(cli_level: Option<&str>) -> Result<()> {
    let level = match cli_level {
        Some(s) => match parse_level_str(s) {
            Some(level) => level,
            None => bail!("unknown log level `{s}`"),
        },
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(Level::WARN),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
