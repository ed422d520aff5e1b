//! The taskcon pages.
//!
//! - `process_list`: the main table, filter and kill
//! - `setup`: view and change settings
//! - `help`, `about`: static text
//!
//! Every page wraps a `Screen<Command>`; a confirmed message box hands the
//! page back the command it was opened with.

pub mod about;
pub mod help;
pub mod process_list;
pub mod setup;

use crossterm::event::{KeyEvent, KeyModifiers};

use crate::commands::{Command, CommandOutcome};
use crate::console::Console;
use crate::error::UiError;
use crate::state::AppState;
use crate::ui::theme;
use crate::ui::{Buttons, Dock, Label, RenderContext, Screen, ScreenApplication, ScreenId};

pub use about::AboutScreen;
pub use help::HelpScreen;
pub use process_list::ProcessListScreen;
pub use setup::SetupScreen;

pub const PROCESSES: ScreenId = "processes";
pub const SETUP: ScreenId = "setup";
pub const HELP: ScreenId = "help";
pub const ABOUT: ScreenId = "about";

/// Register every page with the application.
pub fn register_all<T: Console>(app: &mut ScreenApplication<T, AppState>) -> Result<(), UiError> {
    app.register_screen(Box::new(ProcessListScreen::new()))?;
    app.register_screen(Box::new(SetupScreen::new()))?;
    app.register_screen(Box::new(HelpScreen::new()))?;
    app.register_screen(Box::new(AboutScreen::new()))?;
    Ok(())
}

/// Bottom status strip.
pub(crate) fn status_bar(name: &str, text: &str) -> Label {
    Label::new(name, text)
        .with_dock(Dock::Bottom(1))
        .with_colours(theme::STATUS_FG, theme::STATUS_BG)
}

/// Top title strip.
pub(crate) fn title_bar(name: &str, text: &str) -> Label {
    Label::new(name, text)
        .with_dock(Dock::Top(1))
        .with_colours(theme::HEADER_FG, theme::HEADER_BG)
}

/// Show a failure in a message box. Returns the status message of a
/// successful outcome.
pub(crate) fn present(
    screen: &mut Screen<Command>,
    outcome: CommandOutcome,
    ctx: &mut RenderContext<'_>,
) -> Option<String> {
    match outcome {
        CommandOutcome::Done(message) => message,
        CommandOutcome::Failed { title, message } => {
            screen.show_message_box(&title, &message, Buttons::Ok, None, ctx);
            None
        }
    }
}

/// Keys carrying Ctrl or Alt are never page shortcuts.
pub(crate) fn is_plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crate::settings::Settings;
    use crate::system::StaticSource;
    use crate::types::{ProcessInfo, SystemSnapshot};
    use crossterm::event::KeyCode;

    pub(crate) fn app_with(
        processes: Vec<ProcessInfo>,
    ) -> ScreenApplication<MemoryConsole, AppState> {
        let source = StaticSource {
            snapshot: SystemSnapshot {
                processes,
                memory_total: 8 << 30,
                memory_available: 6 << 30,
                ..Default::default()
            },
            ..Default::default()
        };
        let state = AppState::new(Box::new(source), Settings::default(), None);
        let mut app = ScreenApplication::new(MemoryConsole::new(100, 30), state);
        register_all(&mut app).unwrap();
        app
    }

    /// Queue keys and run the loop until they are consumed.
    pub(crate) fn press(app: &mut ScreenApplication<MemoryConsole, AppState>, codes: &[KeyCode]) {
        for code in codes {
            app.console_mut().push_code(*code);
        }
        while app.console().pending_keys() > 0 {
            if !app.step().unwrap() {
                break;
            }
        }
    }

    #[test]
    fn test_all_pages_register_once() {
        let mut app = app_with(vec![]);
        assert!(matches!(
            app.register_screen(Box::new(HelpScreen::new())),
            Err(UiError::DuplicateScreen(HELP))
        ));
    }

    #[test]
    fn test_help_and_about_open_from_the_process_list() {
        let mut app = app_with(vec![]);
        app.show_screen(PROCESSES).unwrap();

        press(&mut app, &[KeyCode::F(1)]);
        assert_eq!(app.context().owner(), Some(HELP));
        assert!(app.console().contains("Keys"));

        press(&mut app, &[KeyCode::Esc, KeyCode::Char('a')]);
        assert_eq!(app.context().owner(), Some(ABOUT));
        assert!(app.console().contains(env!("CARGO_PKG_VERSION")));

        press(&mut app, &[KeyCode::Char('q')]);
        assert_eq!(app.context().screens(), &[PROCESSES]);
    }
}
