//! Log setup.
//!
//! The terminal belongs to the UI, so events go to a file, never to stdout or
//! stderr. The filter comes from `TASKCON_LOG`, then `RUST_LOG`, then
//! [`DEFAULT_FILTER`].

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "TASKCON_LOG";
pub const DEFAULT_FILTER: &str = "taskcon=info";

/// Returns the default log file path.
///
/// On Linux: ~/.local/share/taskcon/taskcon.log
pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskcon")
        .join("taskcon.log")
}

/// Filter from the environment, falling back to the default directive.
pub fn build_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber writing to `path`.
///
/// Must be called once at startup. If the file cannot be opened logging
/// stays disabled and the error is returned for the caller to report.
pub fn init_logging(path: &Path) -> io::Result<()> {
    let file = open_log(path)?;
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(io::Error::other)
}
