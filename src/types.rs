//! Domain types for taskcon.

use std::cmp::Ordering;
use std::time::Duration;

// ============================================================================
// ENUMS
// ============================================================================

/// Scheduler state letter from `/proc/[pid]/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// R
    Running,
    /// S
    Sleeping,
    /// D, uninterruptible I/O wait
    DiskSleep,
    /// T or t
    Stopped,
    /// Z
    Zombie,
    /// I, idle kernel thread
    Idle,
    /// Anything else (X, W, P, ...)
    Other(char),
}

impl ProcessState {
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => ProcessState::Running,
            'S' => ProcessState::Sleeping,
            'D' => ProcessState::DiskSleep,
            'T' | 't' => ProcessState::Stopped,
            'Z' => ProcessState::Zombie,
            'I' => ProcessState::Idle,
            other => ProcessState::Other(other),
        }
    }

    pub fn code(self) -> char {
        match self {
            ProcessState::Running => 'R',
            ProcessState::Sleeping => 'S',
            ProcessState::DiskSleep => 'D',
            ProcessState::Stopped => 'T',
            ProcessState::Zombie => 'Z',
            ProcessState::Idle => 'I',
            ProcessState::Other(c) => c,
        }
    }
}

/// Column the process list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Pid,
    User,
    State,
    #[default]
    Cpu,
    Memory,
    Threads,
    Name,
}

impl SortColumn {
    pub const ALL: [SortColumn; 7] = [
        SortColumn::Pid,
        SortColumn::User,
        SortColumn::State,
        SortColumn::Cpu,
        SortColumn::Memory,
        SortColumn::Threads,
        SortColumn::Name,
    ];

    /// Settings-file spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SortColumn::Pid => "pid",
            SortColumn::User => "user",
            SortColumn::State => "state",
            SortColumn::Cpu => "cpu",
            SortColumn::Memory => "memory",
            SortColumn::Threads => "threads",
            SortColumn::Name => "name",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s))
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Ascending comparison of two processes on this column.
    pub fn compare(self, a: &ProcessInfo, b: &ProcessInfo) -> Ordering {
        let primary = match self {
            SortColumn::Pid => a.pid.cmp(&b.pid),
            SortColumn::User => a.user.cmp(&b.user),
            SortColumn::State => a.state.code().cmp(&b.state.code()),
            SortColumn::Cpu => a.cpu_percent.total_cmp(&b.cpu_percent),
            SortColumn::Memory => a.resident_bytes.cmp(&b.resident_bytes),
            SortColumn::Threads => a.threads.cmp(&b.threads),
            SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        primary.then(a.pid.cmp(&b.pid))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One process as seen in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    /// Short name (`comm`).
    pub name: String,
    pub user: String,
    pub state: ProcessState,
    pub threads: u32,
    /// Share of one CPU since the previous snapshot.
    pub cpu_percent: f64,
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
    /// Full command line; empty for kernel threads.
    pub command: String,
}

impl ProcessInfo {
    /// Kernel threads have no command line.
    pub fn is_kernel_thread(&self) -> bool {
        self.command.is_empty()
    }

    /// Command line if there is one, else the bracketed short name.
    pub fn display_command(&self) -> String {
        if self.command.is_empty() {
            format!("[{}]", self.name)
        } else {
            self.command.clone()
        }
    }
}

/// Everything one refresh produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSnapshot {
    pub processes: Vec<ProcessInfo>,
    /// Busy share of all CPUs since the previous snapshot.
    pub cpu_percent: f64,
    pub memory_total: u64,
    pub memory_available: u64,
    pub uptime: Duration,
    pub load_average: [f64; 3],
}

impl SystemSnapshot {
    pub fn memory_used(&self) -> u64 {
        self.memory_total.saturating_sub(self.memory_available)
    }

    pub fn find(&self, pid: u32) -> Option<&ProcessInfo> {
        self.processes.iter().find(|p| p.pid == pid)
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Typed view of the `display.*` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub refresh: Duration,
    pub show_kernel_threads: bool,
    pub sort_column: SortColumn,
    pub sort_descending: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            refresh: Duration::from_millis(1500),
            show_kernel_threads: false,
            sort_column: SortColumn::Cpu,
            sort_descending: true,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn process(pid: u32, name: &str, cpu: f64, rss: u64) -> ProcessInfo {
        ProcessInfo {
            pid,
            ppid: 1,
            name: name.to_string(),
            user: "root".to_string(),
            state: ProcessState::Sleeping,
            threads: 1,
            cpu_percent: cpu,
            resident_bytes: rss,
            virtual_bytes: rss * 4,
            command: format!("/usr/bin/{name}"),
        }
    }

    #[test]
    fn test_state_codes_round_trip_known_letters() {
        for code in ['R', 'S', 'D', 'T', 'Z', 'I'] {
            assert_eq!(ProcessState::from_code(code).code(), code);
        }
        assert_eq!(ProcessState::from_code('t'), ProcessState::Stopped);
        assert_eq!(ProcessState::from_code('X'), ProcessState::Other('X'));
    }

    #[test]
    fn test_sort_column_cycles() {
        assert_eq!(SortColumn::Name.next(), SortColumn::Pid);
        assert_eq!(SortColumn::Pid.previous(), SortColumn::Name);
        assert_eq!(SortColumn::parse("MEMORY"), Some(SortColumn::Memory));
        assert_eq!(SortColumn::parse("bogus"), None);
    }

    #[test]
    fn test_compare_breaks_ties_on_pid() {
        let a = process(10, "a", 5.0, 100);
        let b = process(20, "b", 5.0, 100);
        assert_eq!(SortColumn::Cpu.compare(&a, &b), Ordering::Less);
        assert_eq!(SortColumn::Memory.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_kernel_threads_display_bracketed() {
        let mut p = process(2, "kthreadd", 0.0, 0);
        p.command.clear();
        assert!(p.is_kernel_thread());
        assert_eq!(p.display_command(), "[kthreadd]");
    }

    #[test]
    fn test_memory_used_saturates() {
        let snap = SystemSnapshot {
            memory_total: 100,
            memory_available: 150,
            ..Default::default()
        };
        assert_eq!(snap.memory_used(), 0);
    }
}
