//! Shared application state: pure data plus the process source.
//!
//! Every screen sees the same `AppState` through its page context. Screens
//! keep only their own widget state; process data, the filter and the
//! settings live here.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::commands::{filter_processes, sort_processes};
use crate::error::SystemError;
use crate::settings::Settings;
use crate::system::ProcessSource;
use crate::types::{ProcessInfo, SystemSnapshot};

pub struct AppState {
    pub source: Box<dyn ProcessSource>,
    pub settings: Settings,
    /// Where settings are saved. None when saving is disabled.
    pub settings_path: Option<PathBuf>,
    /// Case-insensitive substring the process list is narrowed to.
    pub filter: String,
    pub snapshot: SystemSnapshot,
    last_refresh: Option<Instant>,
}

impl AppState {
    pub fn new(
        source: Box<dyn ProcessSource>,
        settings: Settings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        AppState {
            source,
            settings,
            settings_path,
            filter: String::new(),
            snapshot: SystemSnapshot::default(),
            last_refresh: None,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.settings.display_options().refresh
    }

    /// True when no snapshot was taken yet or the interval has elapsed.
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.last_refresh
            .is_none_or(|at| now.duration_since(at) >= self.refresh_interval())
    }

    /// Take a new snapshot. On failure the previous one is kept.
    pub fn refresh(&mut self) -> Result<(), SystemError> {
        self.last_refresh = Some(Instant::now());
        match self.source.snapshot() {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "snapshot failed");
                Err(err)
            }
        }
    }

    /// Processes after filtering and sorting per the current settings.
    pub fn visible_processes(&self) -> Vec<ProcessInfo> {
        let options = self.settings.display_options();
        let mut processes =
            filter_processes(&self.snapshot.processes, &self.filter, options.show_kernel_threads);
        sort_processes(&mut processes, options.sort_column, options.sort_descending);
        processes
    }
}
