use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// `LogKind` represents where logs go: `stderr` or a log file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogKind {
    /// It logs to stderr, the default choice. Stdout is left to the listing.
    STDERR,

    /// It logs on a file in <tmp>/c28dis-<timestamp>.log
    FILE,
}

/// Keeps the log sink alive. Buffered lines are flushed when it is dropped,
/// so hold it until the program is done logging.
pub struct LoggerGuard {
    _worker: Option<WorkerGuard>,
    path: Option<PathBuf>,
}

impl LoggerGuard {
    /// Log file path, for [`LogKind::FILE`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global `tracing` subscriber.
///
/// Does nothing but return a guard if a subscriber is already installed.
pub fn init_logger(kind: LogKind) -> std::io::Result<LoggerGuard> {
    match kind {
        LogKind::STDERR => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .try_init()
                .ok();

            Ok(LoggerGuard {
                _worker: None,
                path: None,
            })
        }
        LogKind::FILE => {
            let filename = format!("c28dis-{}.log", Utc::now().timestamp());
            let path = std::env::temp_dir().join(filename);
            let file = std::fs::File::create(&path)?;
            let (writer, worker) = tracing_appender::non_blocking(file);

            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .ok();

            Ok(LoggerGuard {
                _worker: Some(worker),
                path: Some(path),
            })
        }
    }
}
