//! Error types, one enum per concern.

use std::path::PathBuf;

use thiserror::Error;

/// Misuse of the screen framework, or a dead console.
#[derive(Error, Debug)]
pub enum UiError {
    /// A screen with this id is already registered
    #[error("screen already registered: {0}")]
    DuplicateScreen(&'static str),

    /// Show or run was asked for an id nobody registered
    #[error("screen not registered: {0}")]
    UnregisteredScreen(String),

    /// `run` was called a second time
    #[error("application loop already started")]
    AlreadyRunning,

    /// Terminal I/O failed; the loop cannot continue
    #[error("console I/O error: {0}")]
    Console(#[from] std::io::Error),
}

/// Failure reading process data or acting on a process.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("process {pid} not found")]
    NoSuchProcess { pid: u32 },

    #[error("not permitted to signal process {pid}")]
    PermissionDenied { pid: u32 },

    #[error("signal to process {pid} failed: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading or saving the settings store.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("setting {key} is not a valid {expected}: {value:?}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: String,
    },

    #[error("unknown setting: {0}")]
    UnknownKey(String),
}
