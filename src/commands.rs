//! User commands and the pure helpers behind the process list.
//!
//! Screens turn keys into a [`Command`]. A command that needs confirmation
//! rides on a message box as its Ok action and runs only when the user
//! confirms. Execution touches `AppState` and nothing else; screens decide
//! how to present the [`CommandOutcome`].

use tracing::{info, warn};

use crate::settings::{CONFIRM_KILL, SORT_COLUMN, SORT_DESCENDING};
use crate::state::AppState;
use crate::types::{ProcessInfo, SortColumn};

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SortNext,
    SortPrevious,
    SortReverse,
    SetFilter(String),
    ClearFilter,
    /// Send SIGTERM. `name` is kept for messages.
    Kill { pid: u32, name: String },
    ToggleSetting(&'static str),
    SetSetting { key: &'static str, value: String },
    SaveSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied, with an optional status line message.
    Done(Option<String>),
    /// Not applied; show the message in a box.
    Failed { title: String, message: String },
}

impl Command {
    /// Title and text of the confirmation box, if this command needs one.
    pub fn confirmation(&self, state: &AppState) -> Option<(String, String)> {
        match self {
            Command::Kill { pid, name }
                if state.settings.get_bool(CONFIRM_KILL).unwrap_or(true) =>
            {
                Some((
                    "Kill process".to_string(),
                    format!("Send SIGTERM to {name} (pid {pid})?"),
                ))
            }
            _ => None,
        }
    }

    pub fn execute(&self, state: &mut AppState) -> CommandOutcome {
        match self {
            Command::SortNext | Command::SortPrevious => {
                let current = state.settings.display_options().sort_column;
                let column = if *self == Command::SortNext {
                    current.next()
                } else {
                    current.previous()
                };
                set_or_fail(state, SORT_COLUMN, column.as_str())
                    .unwrap_or_else(|| CommandOutcome::Done(Some(sort_message(column))))
            }
            Command::SortReverse => match state.settings.toggle(SORT_DESCENDING) {
                Ok(true) => CommandOutcome::Done(Some("Sorting descending".to_string())),
                Ok(false) => CommandOutcome::Done(Some("Sorting ascending".to_string())),
                Err(err) => failed("Setting not changed", err),
            },
            Command::SetFilter(text) => {
                state.filter = text.trim().to_string();
                CommandOutcome::Done(None)
            }
            Command::ClearFilter => {
                state.filter.clear();
                CommandOutcome::Done(None)
            }
            Command::Kill { pid, name } => match state.source.terminate(*pid) {
                Ok(()) => {
                    info!(pid, name = %name, "sent SIGTERM");
                    let sent = format!("Sent SIGTERM to {name} (pid {pid})");
                    match state.refresh() {
                        Ok(()) => CommandOutcome::Done(Some(sent)),
                        Err(err) => {
                            CommandOutcome::Done(Some(format!("{sent}; refresh failed: {err}")))
                        }
                    }
                }
                Err(err) => {
                    warn!(pid, error = %err, "kill failed");
                    failed("Kill failed", err)
                }
            },
            Command::ToggleSetting(key) => match state.settings.toggle(key) {
                Ok(_) => CommandOutcome::Done(None),
                Err(err) => failed("Setting not changed", err),
            },
            Command::SetSetting { key, value } => {
                set_or_fail(state, key, value).unwrap_or(CommandOutcome::Done(None))
            }
            Command::SaveSettings => {
                let Some(path) = state.settings_path.clone() else {
                    return CommandOutcome::Done(Some("Saving is disabled".to_string()));
                };
                match state.settings.save(&path) {
                    Ok(()) => CommandOutcome::Done(Some(format!("Saved to {}", path.display()))),
                    Err(err) => failed("Save failed", err),
                }
            }
        }
    }
}

fn failed(title: &str, err: impl std::fmt::Display) -> CommandOutcome {
    CommandOutcome::Failed {
        title: title.to_string(),
        message: err.to_string(),
    }
}

fn set_or_fail(state: &mut AppState, key: &str, value: &str) -> Option<CommandOutcome> {
    state
        .settings
        .set(key, value)
        .err()
        .map(|err| failed("Setting not changed", err))
}

fn sort_message(column: SortColumn) -> String {
    format!("Sorting by {}", column.as_str())
}

// ============================================================================
// FILTER / SORT
// ============================================================================

/// Processes whose name, command line or user contains `filter`, ignoring
/// case. Kernel threads are dropped unless `show_kernel` is set.
pub fn filter_processes(
    processes: &[ProcessInfo],
    filter: &str,
    show_kernel: bool,
) -> Vec<ProcessInfo> {
    let needle = filter.trim().to_lowercase();
    processes
        .iter()
        .filter(|p| show_kernel || !p.is_kernel_thread())
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.command.to_lowercase().contains(&needle)
                || p.user.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn sort_processes(processes: &mut [ProcessInfo], column: SortColumn, descending: bool) {
    processes.sort_by(|a, b| {
        let ordering = column.compare(a, b);
        if descending { ordering.reverse() } else { ordering }
    });
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Settings, REFRESH_MS, SHOW_KERNEL_THREADS};
    use crate::state::tests::state_with;
    use crate::system::StaticSource;
    use crate::types::tests::process;
    use crate::types::SystemSnapshot;
    use tempfile::TempDir;

    fn kernel(pid: u32, name: &str) -> ProcessInfo {
        let mut p = process(pid, name, 0.0, 0);
        p.command.clear();
        p
    }

    #[test]
    fn test_filter_matches_name_command_and_user() {
        let mut alice = process(3, "vim", 0.0, 0);
        alice.user = "alice".to_string();
        let list = vec![process(1, "sshd", 0.0, 0), process(2, "bash", 0.0, 0), alice];

        let names = |filter: &str| -> Vec<u32> {
            filter_processes(&list, filter, false).iter().map(|p| p.pid).collect()
        };
        assert_eq!(names("SSH"), vec![1]);
        assert_eq!(names("/usr/bin/ba"), vec![2]);
        assert_eq!(names("ALICE"), vec![3]);
        assert_eq!(names("  "), vec![1, 2, 3]);
    }

    #[test]
    fn test_filter_hides_kernel_threads_unless_asked() {
        let list = vec![kernel(2, "kthreadd"), process(10, "init", 0.0, 0)];
        assert_eq!(filter_processes(&list, "", false).len(), 1);
        assert_eq!(filter_processes(&list, "", true).len(), 2);
    }

    #[test]
    fn test_sort_descending_reverses_ties_too() {
        let mut list = vec![
            process(1, "a", 2.0, 0),
            process(2, "b", 9.0, 0),
            process(3, "c", 2.0, 0),
        ];
        sort_processes(&mut list, SortColumn::Cpu, true);
        let pids: Vec<u32> = list.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![2, 3, 1]);

        sort_processes(&mut list, SortColumn::Name, false);
        let pids: Vec<u32> = list.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_commands_update_settings() {
        let mut state = state_with(vec![]);
        assert_eq!(
            Command::SortNext.execute(&mut state),
            CommandOutcome::Done(Some("Sorting by memory".to_string()))
        );
        Command::SortPrevious.execute(&mut state);
        Command::SortPrevious.execute(&mut state);
        assert_eq!(state.settings.display_options().sort_column, SortColumn::State);

        Command::SortReverse.execute(&mut state);
        assert!(!state.settings.display_options().sort_descending);
    }

    #[test]
    fn test_filter_commands_set_and_clear() {
        let mut state = state_with(vec![]);
        Command::SetFilter("  nginx ".to_string()).execute(&mut state);
        assert_eq!(state.filter, "nginx");
        Command::ClearFilter.execute(&mut state);
        assert!(state.filter.is_empty());
    }

    #[test]
    fn test_kill_needs_confirmation_by_default() {
        let mut state = state_with(vec![]);
        let kill = Command::Kill {
            pid: 42,
            name: "sleep".to_string(),
        };
        let (title, text) = kill.confirmation(&state).unwrap();
        assert_eq!(title, "Kill process");
        assert!(text.contains("sleep (pid 42)"));

        state.settings.set(CONFIRM_KILL, "false").unwrap();
        assert!(kill.confirmation(&state).is_none());
        assert!(Command::SortNext.confirmation(&state).is_none());
    }

    #[test]
    fn test_kill_terminates_and_refreshes() {
        let mut state = state_with(vec![process(42, "sleep", 0.0, 0), process(43, "cat", 0.0, 0)]);
        state.refresh().unwrap();
        let outcome = Command::Kill {
            pid: 42,
            name: "sleep".to_string(),
        }
        .execute(&mut state);
        assert!(matches!(outcome, CommandOutcome::Done(Some(_))));
        assert!(state.snapshot.find(42).is_none());
        assert!(state.snapshot.find(43).is_some());
    }

    #[test]
    fn test_kill_reports_a_failed_refresh() {
        let source = StaticSource {
            snapshot: SystemSnapshot {
                processes: vec![process(42, "sleep", 0.0, 0)],
                ..Default::default()
            },
            fail_snapshot: true,
            ..Default::default()
        };
        let mut state = AppState::new(Box::new(source), Settings::default(), None);
        let outcome = Command::Kill {
            pid: 42,
            name: "sleep".to_string(),
        }
        .execute(&mut state);
        let CommandOutcome::Done(Some(message)) = outcome else {
            panic!("expected a status message, got {outcome:?}");
        };
        assert!(message.starts_with("Sent SIGTERM to sleep (pid 42)"));
        assert!(message.contains("refresh failed: malformed /proc/stat"));
    }

    #[test]
    fn test_kill_failure_is_reported() {
        let source = StaticSource {
            snapshot: SystemSnapshot::default(),
            fail_terminate: true,
            ..Default::default()
        };
        let mut state = AppState::new(Box::new(source), Settings::default(), None);
        let outcome = Command::Kill {
            pid: 1,
            name: "init".to_string(),
        }
        .execute(&mut state);
        let CommandOutcome::Failed { title, message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(title, "Kill failed");
        assert!(message.contains('1'));
    }

    #[test]
    fn test_settings_commands_validate() {
        let mut state = state_with(vec![]);
        assert_eq!(
            Command::ToggleSetting(SHOW_KERNEL_THREADS).execute(&mut state),
            CommandOutcome::Done(None)
        );
        assert!(state.settings.display_options().show_kernel_threads);

        let bad = Command::SetSetting {
            key: REFRESH_MS,
            value: "1".to_string(),
        };
        assert!(matches!(bad.execute(&mut state), CommandOutcome::Failed { .. }));
        assert_eq!(state.settings.get(REFRESH_MS), Some("1500"));
    }

    #[test]
    fn test_save_respects_disabled_path() {
        let mut state = state_with(vec![]);
        assert_eq!(
            Command::SaveSettings.execute(&mut state),
            CommandOutcome::Done(Some("Saving is disabled".to_string()))
        );

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        state.settings_path = Some(path.clone());
        state.settings.toggle(CONFIRM_KILL).unwrap();
        assert!(matches!(
            Command::SaveSettings.execute(&mut state),
            CommandOutcome::Done(Some(_))
        ));
        assert!(path.exists());
        assert!(!state.settings.is_dirty());
    }
}
