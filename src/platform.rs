//! procfs detection for Linux.
//!
//! Encodes assumptions about where process data lives as named constants.
//! Provides detection with explicit state representation.
//!
//! Structure:
//! - Constants: known paths (documented invariants)
//! - Types: possible detection states (sum type)
//! - Pure functions: path construction
//! - Effect functions: filesystem detection

use std::path::{Path, PathBuf};

// ============================================================================
// CONSTANTS (Documented Invariants)
// ============================================================================

/// Mount point of the process filesystem.
pub const PROC_ROOT: &str = "/proc";

/// Local account database used to map uids to names.
pub const PASSWD_PATH: &str = "/etc/passwd";

/// Files under the proc root that must be readable for the monitor to work.
pub const REQUIRED_FILES: [&str; 3] = ["stat", "meminfo", "uptime"];

// ============================================================================
// TYPES (State Representation)
// ============================================================================

/// What we found at the proc root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcfsState {
    /// Mounted and all required files readable.
    Available { root: PathBuf },

    /// Directory present but a required file is missing or unreadable.
    Incomplete { root: PathBuf, missing: PathBuf },

    /// Nothing mounted at the expected path.
    NotMounted { expected: PathBuf },
}

impl ProcfsState {
    pub fn is_available(&self) -> bool {
        matches!(self, ProcfsState::Available { .. })
    }
}

// ============================================================================
// PURE FUNCTIONS (Path Construction)
// ============================================================================

/// Paths of the required files under `root`.
///
/// Pure function, no I/O.
pub fn required_paths(root: &Path) -> Vec<PathBuf> {
    REQUIRED_FILES.iter().map(|f| root.join(f)).collect()
}

// ============================================================================
// EFFECT FUNCTIONS (Detection)
// ============================================================================

/// Detect procfs at the standard mount point.
pub fn detect_procfs() -> ProcfsState {
    detect_procfs_at(Path::new(PROC_ROOT))
}

/// Detect procfs under `root`.
///
/// Separated for testability: tests point it at a fixture tree.
pub fn detect_procfs_at(root: &Path) -> ProcfsState {
    if !root.is_dir() {
        return ProcfsState::NotMounted {
            expected: root.to_path_buf(),
        };
    }
    for path in required_paths(root) {
        if std::fs::read_to_string(&path).is_err() {
            return ProcfsState::Incomplete {
                root: root.to_path_buf(),
                missing: path,
            };
        }
    }
    ProcfsState::Available {
        root: root.to_path_buf(),
    }
}

// ============================================================================
// DISPLAY (User-Friendly Messages)
// ============================================================================

impl std::fmt::Display for ProcfsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcfsState::Available { root } => write!(f, "procfs available ({})", root.display()),
            ProcfsState::Incomplete { root, missing } => write!(
                f,
                "procfs at {} is incomplete (cannot read {})",
                root.display(),
                missing.display()
            ),
            ProcfsState::NotMounted { expected } => {
                write!(f, "procfs not mounted (expected: {})", expected.display())
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
