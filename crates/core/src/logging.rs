//! File logging for the CLI and library.
//!
//! Output lands in the XDG state dir as `tldw.YYYY-MM-DD.log`, one file per
//! day, and only the newest two weeks are kept. Nothing is written to the
//! terminal so spinners and reports render undisturbed.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{Config, LoggingConfig},
    error::{Result, TldwError},
};

const LOG_PREFIX: &str = "tldw";
const LOG_SUFFIX: &str = "log";
const KEPT_LOG_FILES: usize = 14;

/// Our crates log at `level`; HTTP and runtime crates only report warnings.
fn default_directives(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("warn,tldw_core={level},tldw={level}")
}

/// Start logging to the rotating file. Keep the guard alive until exit.
///
/// `RUST_LOG` replaces the configured directives entirely.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(KEPT_LOG_FILES)
        .build(&log_dir)
        .map_err(|e| TldwError::Config {
            path: log_dir.clone(),
            reason: e.to_string(),
        })?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!(
        dir = %log_dir.display(),
        level = %config.level,
        version = env!("CARGO_PKG_VERSION"),
        "tldw started"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Route logs to the test harness; safe to call from every test
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Flushes pending log lines when dropped
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_scope_our_crates() {
        assert_eq!(
            default_directives("debug"),
            "warn,tldw_core=debug,tldw=debug"
        );
        assert_eq!(default_directives("  "), "warn,tldw_core=info,tldw=info");
        assert!(EnvFilter::try_new(default_directives("trace")).is_ok());
    }
}
