use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::errors::StorageError;

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Install the global tracing subscriber: `RUST_LOG`-style env filter
/// (default `info`) writing to a daily-rolling file in `log_dir`.
///
/// Intended for the embedding shell's startup. Safe to call more than once;
/// only the first call installs a subscriber.
pub fn init(log_dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "ptd-launcher.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_file(true)
        .with_line_number(true)
        .finish();

    // A subscriber may already be installed (repeat init, or the host app
    // brought its own); that is not an error for us.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(())
}
