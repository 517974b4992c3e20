//! Tracing setup
//!
//! The TUI owns the terminal, so interactive runs log to a file under the
//! system temp directory. Headless subcommands log compactly to stderr.
//! Both honor `RUST_LOG` and default to `info`.

use eyre::{Result, WrapErr};
use std::{env, fs, path::PathBuf, sync::Once};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .wrap_err("invalid log filter")
}

/// `<tmp>/chalkstep-logs/<component>`
pub fn log_directory(component: &str) -> Result<PathBuf> {
    let dir = env::temp_dir().join("chalkstep-logs").join(component);
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("failed to create log directory {}", dir.display()))?;
    Ok(dir)
}

/// Log to `<tmp>/chalkstep-logs/<component>/<component>.log`.
///
/// Keep the returned guard alive for the lifetime of the program; dropping
/// it flushes and stops the background writer.
pub fn init_file_logging(component: &str) -> Result<WorkerGuard> {
    let dir = log_directory(component)?;
    let appender = rolling::never(&dir, format!("{}.log", component));
    let (writer, guard) = non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter("info")?)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| eyre::eyre!("failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(component, log_dir = %dir.display(), "file logging initialized");
    Ok(guard)
}

/// Compact stderr logging for headless commands
pub fn init_console_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level.as_str())?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| eyre::eyre!("failed to initialize console logging: {}", e))
}

static TEST_LOGGING: Once = Once::new();

/// Idempotent console logging for tests
pub fn ensure_test_logging() {
    TEST_LOGGING.call_once(|| {
        // Another subscriber may already be installed; that is fine
        let _ = init_console_logging(Level::DEBUG);
    });
}
