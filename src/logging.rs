//! Tracing subscriber setup
//!
//! Console output is always on (human-readable or JSON lines). When a log
//! directory is configured, a daily-rolling JSON file is written alongside it
//! through a non-blocking appender. `RUST_LOG` takes precedence over the
//! configured level.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for rolled log files (`datastore-export.log.YYYY-MM-DD`)
const LOG_FILE_PREFIX: &str = "datastore-export.log";

/// Keeps the background log writer alive
///
/// Dropping the guard flushes buffered file output; hold it until the
/// process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global tracing subscriber
///
/// Fails if the level cannot be parsed, the log directory cannot be created
/// or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_filter(&config.level)?;

    let console = if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let (file_layer, file_writer) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install tracing subscriber: {e}")))?;

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// `RUST_LOG` when set, otherwise the configured level
fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(level)
        .map_err(|e| Error::config("logging.level", format!("invalid log level '{level}': {e}")))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_levels_and_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("info,sqlx=warn").is_ok());
    }

    #[test]
    fn rejects_garbage_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("info,sqlx=notalevel").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
