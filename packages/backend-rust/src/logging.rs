use std::io;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "practice-engine.log";

/// Keeps the non-blocking file writer alive; drop it last in `main`
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Daily-rolling appender under `dir`, creating the directory first
fn file_writer(dir: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Stdout always; a file layer as well when `config.file_dir()` is set.
/// A log directory that cannot be created degrades to stdout only.
pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let file = config.file_dir().and_then(|dir| match file_writer(dir) {
        Ok(writer) => Some((dir, writer)),
        Err(err) => {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            None
        }
    });

    let (file_layer, guard, file_dir) = match file {
        Some((dir, (writer, guard))) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(FileLogGuard { _guard: guard }),
            Some(dir),
        ),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let Some(dir) = file_dir {
        tracing::info!(dir = %dir.display(), "file logging enabled");
    }
    guard
}
