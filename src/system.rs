//! Process and system statistics read from procfs.
//!
//! Structure:
//! - Pure parsers over file content (`parse_*`), testable without `/proc`
//! - [`ProcessSource`]: what the screens consume
//! - [`ProcfsSource`]: the Linux implementation
//!
//! CPU percentages are deltas, so the first snapshot reports zero for
//! every process and for the system.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::error::SystemError;
use crate::platform::{PASSWD_PATH, PROC_ROOT};
use crate::types::{ProcessInfo, ProcessState, SystemSnapshot};
use crate::ui::text::sanitize;

// ============================================================================
// PURE PARSERS
// ============================================================================

/// Aggregate CPU counters from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub total: u64,
    /// idle + iowait
    pub idle: u64,
}

impl CpuTimes {
    /// Busy percentage between `self` (earlier) and `later`.
    pub fn busy_percent(&self, later: &CpuTimes) -> f64 {
        let total = later.total.saturating_sub(self.total);
        if total == 0 {
            return 0.0;
        }
        let idle = later.idle.saturating_sub(self.idle);
        (total.saturating_sub(idle)) as f64 * 100.0 / total as f64
    }
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|v| v.parse().ok())
        .collect::<Option<_>>()?;
    if values.len() < 4 {
        return None;
    }
    let iowait = values.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        total: values.iter().sum(),
        idle: values[3] + iowait,
    })
}

/// (total, available) memory in bytes from `/proc/meminfo`.
///
/// Falls back to MemFree + Buffers + Cached on kernels without MemAvailable.
pub fn parse_meminfo(content: &str) -> Option<(u64, u64)> {
    let mut fields: HashMap<&str, u64> = HashMap::new();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        if let Some(kb) = rest.split_whitespace().next().and_then(|v| v.parse().ok()) {
            fields.insert(key.trim(), kb);
        }
    }
    let total = *fields.get("MemTotal")?;
    let available = fields.get("MemAvailable").copied().unwrap_or_else(|| {
        ["MemFree", "Buffers", "Cached"]
            .iter()
            .filter_map(|k| fields.get(k))
            .sum()
    });
    Some((total * 1024, available * 1024))
}

/// First field of `/proc/uptime`.
pub fn parse_uptime(content: &str) -> Option<Duration> {
    let secs: f64 = content.split_whitespace().next()?.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

/// 1, 5 and 15 minute load averages from `/proc/loadavg`.
pub fn parse_loadavg(content: &str) -> Option<[f64; 3]> {
    let mut parts = content.split_whitespace();
    let mut load = [0.0; 3];
    for slot in &mut load {
        *slot = parts.next()?.parse().ok()?;
    }
    Some(load)
}

/// Fields used from `/proc/[pid]/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidStat {
    pub pid: u32,
    pub comm: String,
    pub state: ProcessState,
    pub ppid: u32,
    /// utime + stime in clock ticks
    pub ticks: u64,
    pub threads: u32,
    pub vsize: u64,
    /// Resident set in pages
    pub rss_pages: u64,
}

/// Parse `/proc/[pid]/stat`.
///
/// The command name sits in parentheses and may itself contain spaces and
/// parentheses, so fields are counted from the last `)`. Any process can set
/// its own name, so control characters in it are replaced.
pub fn parse_pid_stat(content: &str) -> Option<PidStat> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    let pid = content.get(..open)?.trim().parse().ok()?;
    let comm = sanitize(content.get(open + 1..close)?).into_owned();
    let fields: Vec<&str> = content.get(close + 1..)?.split_whitespace().collect();
    if fields.len() < 22 {
        return None;
    }

    // 0: state, 1: ppid, 11: utime, 12: stime, 17: num_threads,
    // 20: vsize, 21: rss
    let utime: u64 = fields[11].parse().ok()?;
    let stime: u64 = fields[12].parse().ok()?;
    Some(PidStat {
        pid,
        comm,
        state: ProcessState::from_code(fields[0].chars().next()?),
        ppid: fields[1].parse().ok()?,
        ticks: utime + stime,
        threads: fields[17].parse().ok()?,
        vsize: fields[20].parse().ok()?,
        rss_pages: fields[21].parse::<i64>().ok()?.max(0) as u64,
    })
}

/// Real uid from `/proc/[pid]/status`.
pub fn parse_status_uid(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|uid| uid.parse().ok())
}

/// NUL-separated `/proc/[pid]/cmdline` as one space-separated string,
/// control characters replaced.
pub fn parse_cmdline(content: &[u8]) -> String {
    let joined = content
        .split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    sanitize(&joined).into_owned()
}

/// uid → user name from `/etc/passwd` content.
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split(':');
            let name = parts.next()?;
            let uid = parts.nth(1)?.parse().ok()?;
            Some((uid, sanitize(name).into_owned()))
        })
        .collect()
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Producer of process data and the one action taken on processes.
pub trait ProcessSource {
    fn snapshot(&mut self) -> Result<SystemSnapshot, SystemError>;

    /// Ask a process to exit (SIGTERM).
    fn terminate(&mut self, pid: u32) -> Result<(), SystemError>;
}

// ============================================================================
// PROCFS SOURCE
// ============================================================================

/// Clock ticks per second, from sysconf.
pub fn clock_ticks() -> u64 {
    // SAFETY: sysconf has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 { ticks as u64 } else { 100 }
}

/// Memory page size in bytes, from sysconf.
pub fn page_size() -> u64 {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as u64 } else { 4096 }
}

pub struct ProcfsSource {
    root: PathBuf,
    users: HashMap<u32, String>,
    clock_ticks: u64,
    page_size: u64,
    previous_cpu: Option<CpuTimes>,
    previous_ticks: HashMap<u32, u64>,
    previous_at: Option<Instant>,
}

impl ProcfsSource {
    /// Source over the live system.
    pub fn new() -> Self {
        Self::with_paths(Path::new(PROC_ROOT), Path::new(PASSWD_PATH))
    }

    /// Source over an arbitrary proc tree and passwd file.
    pub fn with_paths(root: &Path, passwd: &Path) -> Self {
        let users = match fs::read_to_string(passwd) {
            Ok(content) => parse_passwd(&content),
            Err(err) => {
                warn!(path = %passwd.display(), error = %err, "cannot read user database");
                HashMap::new()
            }
        };
        ProcfsSource {
            root: root.to_path_buf(),
            users,
            clock_ticks: clock_ticks(),
            page_size: page_size(),
            previous_cpu: None,
            previous_ticks: HashMap::new(),
            previous_at: None,
        }
    }

    fn read(&self, relative: &str) -> Result<String, SystemError> {
        let path = self.root.join(relative);
        fs::read_to_string(&path).map_err(|source| SystemError::Read { path, source })
    }

    fn user_name(&self, uid: u32) -> String {
        self.users
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    fn pids(&self) -> Result<Vec<u32>, SystemError> {
        let entries = fs::read_dir(&self.root).map_err(|source| SystemError::Read {
            path: self.root.clone(),
            source,
        })?;
        Ok(entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().to_str()?.parse().ok())
            .collect())
    }

    /// Read one process. None when it exited while we were looking.
    fn read_process(&self, pid: u32, elapsed: Option<f64>) -> Option<(ProcessInfo, u64)> {
        let dir = self.root.join(pid.to_string());
        let stat = parse_pid_stat(&fs::read_to_string(dir.join("stat")).ok()?)?;
        let uid = fs::read_to_string(dir.join("status"))
            .ok()
            .and_then(|s| parse_status_uid(&s));
        let command = fs::read(dir.join("cmdline"))
            .map(|bytes| parse_cmdline(&bytes))
            .unwrap_or_default();

        let cpu_percent = match (elapsed, self.previous_ticks.get(&pid)) {
            (Some(secs), Some(&before)) if secs > 0.0 => {
                let delta = stat.ticks.saturating_sub(before) as f64;
                delta * 100.0 / (secs * self.clock_ticks as f64)
            }
            _ => 0.0,
        };

        let info = ProcessInfo {
            pid: stat.pid,
            ppid: stat.ppid,
            name: stat.comm,
            user: uid.map_or_else(|| "?".to_string(), |u| self.user_name(u)),
            state: stat.state,
            threads: stat.threads,
            cpu_percent,
            resident_bytes: stat.rss_pages * self.page_size,
            virtual_bytes: stat.vsize,
            command,
        };
        Some((info, stat.ticks))
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for ProcfsSource {
    fn snapshot(&mut self) -> Result<SystemSnapshot, SystemError> {
        let now = Instant::now();
        let elapsed = self.previous_at.map(|t| now.duration_since(t).as_secs_f64());

        let cpu = parse_cpu_times(&self.read("stat")?).ok_or(SystemError::Parse {
            what: "stat",
            detail: "no aggregate cpu line".to_string(),
        })?;
        let (memory_total, memory_available) =
            parse_meminfo(&self.read("meminfo")?).ok_or(SystemError::Parse {
                what: "meminfo",
                detail: "MemTotal missing".to_string(),
            })?;
        let uptime = parse_uptime(&self.read("uptime")?).unwrap_or_default();
        let load_average = self
            .read("loadavg")
            .ok()
            .and_then(|s| parse_loadavg(&s))
            .unwrap_or_default();

        let mut processes = Vec::new();
        let mut ticks = HashMap::new();
        for pid in self.pids()? {
            if let Some((info, total)) = self.read_process(pid, elapsed) {
                ticks.insert(pid, total);
                processes.push(info);
            } else {
                trace!(pid, "process vanished during scan");
            }
        }

        let cpu_percent = self
            .previous_cpu
            .map_or(0.0, |before| before.busy_percent(&cpu));
        self.previous_cpu = Some(cpu);
        self.previous_ticks = ticks;
        self.previous_at = Some(now);

        debug!(processes = processes.len(), cpu_percent, "snapshot taken");
        Ok(SystemSnapshot {
            processes,
            cpu_percent,
            memory_total,
            memory_available,
            uptime,
            load_average,
        })
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SystemError> {
        // pid 0 and negative values address process groups.
        let Ok(raw) = i32::try_from(pid) else {
            return Err(SystemError::NoSuchProcess { pid });
        };
        if raw <= 0 {
            return Err(SystemError::NoSuchProcess { pid });
        }

        // SAFETY: kill has no memory-safety preconditions.
        let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
        if rc == 0 {
            debug!(pid, "sent SIGTERM");
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Err(SystemError::NoSuchProcess { pid }),
            Some(libc::EPERM) => Err(SystemError::PermissionDenied { pid }),
            _ => Err(SystemError::Signal { pid, source: err }),
        }
    }
}

// ============================================================================
// TEST SOURCE
// ============================================================================

/// Fixed snapshot source for screen and command tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct StaticSource {
    pub snapshot: SystemSnapshot,
    pub terminated: Vec<u32>,
    pub fail_terminate: bool,
    pub fail_snapshot: bool,
}

#[cfg(test)]
impl ProcessSource for StaticSource {
    fn snapshot(&mut self) -> Result<SystemSnapshot, SystemError> {
        if self.fail_snapshot {
            return Err(SystemError::Parse {
                what: "/proc/stat",
                detail: "no cpu line".to_string(),
            });
        }
        Ok(self.snapshot.clone())
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SystemError> {
        if self.fail_terminate {
            return Err(SystemError::PermissionDenied { pid });
        }
        self.terminated.push(pid);
        self.snapshot.processes.retain(|p| p.pid != pid);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
