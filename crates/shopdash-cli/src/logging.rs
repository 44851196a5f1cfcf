//! Tracing setup.
//!
//! Logs go to stderr, filtered by `SHOPDASH_LOG` or the configured level.
//! With `logging.file = true` they are also appended to a daily file under
//! the shopdash home directory.

use std::fs;

use shopdash_core::config::{LoggingConfig, paths};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SHOPDASH_LOG";

const LOG_FILE_PREFIX: &str = "shopdash.log";

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = if config.file {
        let dir = paths::logs_dir();
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().with_ansi(false).with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!("Warning: file logging disabled ({}): {err}", dir.display());
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    // Already installed (e.g. twice in one process) is not an error.
    let _ = tracing_subscriber::registry()
        .with(filter(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}
