//! taskcon CLI
//!
//! Keyboard-driven process monitor for Linux consoles.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use taskcon::console::CrosstermConsole;
use taskcon::logging::{default_log_path, init_logging};
use taskcon::platform::{detect_procfs, ProcfsState, PASSWD_PATH};
use taskcon::screens::{register_all, PROCESSES};
use taskcon::settings::{
    default_settings_path, load_session, Settings, REFRESH_MS, SORT_COLUMN,
};
use taskcon::state::AppState;
use taskcon::system::ProcfsSource;
use taskcon::types::SortColumn;
use taskcon::ui::ScreenApplication;

#[derive(Parser)]
#[command(name = "taskcon")]
#[command(about = "Keyboard-driven console process monitor")]
#[command(version)]
struct Cli {
    /// Refresh interval in milliseconds (overrides the setting)
    #[arg(long, value_name = "MS")]
    refresh: Option<u64>,

    /// Initial sort column (overrides the setting)
    #[arg(long, value_enum)]
    sort: Option<SortColumnArg>,

    /// Settings file (default: ~/.config/taskcon/settings.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file (default: ~/.local/share/taskcon/taskcon.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Do not write settings back on exit
    #[arg(long)]
    no_save: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SortColumnArg {
    Pid,
    User,
    State,
    Cpu,
    Memory,
    Threads,
    Name,
}

impl From<SortColumnArg> for SortColumn {
    fn from(arg: SortColumnArg) -> Self {
        match arg {
            SortColumnArg::Pid => SortColumn::Pid,
            SortColumnArg::User => SortColumn::User,
            SortColumnArg::State => SortColumn::State,
            SortColumnArg::Cpu => SortColumn::Cpu,
            SortColumnArg::Memory => SortColumn::Memory,
            SortColumnArg::Threads => SortColumn::Threads,
            SortColumnArg::Name => SortColumn::Name,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// STARTUP
// ============================================================================

/// Apply command-line overrides on top of the stored settings.
fn apply_overrides(settings: &mut Settings, cli: &Cli) -> Result<(), String> {
    if let Some(ms) = cli.refresh {
        settings
            .set(REFRESH_MS, &ms.to_string())
            .map_err(|e| e.to_string())?;
    }
    if let Some(sort) = cli.sort {
        let column = SortColumn::from(sort);
        settings
            .set(SORT_COLUMN, column.as_str())
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    if let Err(e) = init_logging(&log_path) {
        eprintln!("Note: logging disabled ({}: {})", log_path.display(), e);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "taskcon starting");

    let procfs = detect_procfs();
    let ProcfsState::Available { root } = &procfs else {
        return Err(procfs.to_string());
    };
    info!(%procfs, "procfs detected");

    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let session = load_session(&settings_path);
    if let Some(e) = &session.load_error {
        eprintln!(
            "Note: {}; using defaults, {} will not be overwritten",
            e,
            settings_path.display()
        );
    }
    let mut settings = session.settings;
    apply_overrides(&mut settings, &cli)?;

    let saved_to = if cli.no_save { None } else { session.save_path };
    let source = ProcfsSource::with_paths(root, Path::new(PASSWD_PATH));
    let state = AppState::new(Box::new(source), settings, saved_to);

    let console = CrosstermConsole::open().map_err(|e| format!("cannot open terminal: {}", e))?;
    let mut app = ScreenApplication::new(console, state);
    register_all(&mut app).map_err(|e| e.to_string())?;
    let result = app.run(PROCESSES).map_err(|e| e.to_string());

    // Drop the console first so messages land on the restored terminal.
    let (console, mut state) = app.into_parts();
    drop(console);

    if let Some(path) = state.settings_path.clone() {
        if state.settings.is_dirty() {
            state.settings.save(&path).map_err(|e| e.to_string())?;
        }
    }
    result
}
