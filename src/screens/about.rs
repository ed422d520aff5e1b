//! Version and file locations.

use crossterm::event::KeyEvent;

use crate::commands::Command;
use crate::state::AppState;
use crate::ui::theme;
use crate::ui::{Control, Dock, Label, Page, PageContext, Screen, ScreenId};

use super::ABOUT;

const BODY: &str = "body";

pub struct AboutScreen {
    screen: Screen<Command>,
}

/// Text of the about box.
pub fn about_text(state: &AppState) -> String {
    let settings = state
        .settings_path
        .as_ref()
        .map_or_else(|| "not saved".to_string(), |p| p.display().to_string());
    format!(
        "taskcon {}\n{}\n\nSettings: {}\n\nPress Esc to close",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
        settings,
    )
}

impl AboutScreen {
    pub fn new() -> Self {
        let mut screen = Screen::new(ABOUT);
        screen.base_mut().controls_mut().add(
            Label::new(BODY, "")
                .with_dock(Dock::Centre {
                    width: 76,
                    height: 7,
                })
                .with_colours(theme::DIALOG_FG, theme::DIALOG_BG),
        );
        AboutScreen { screen }
    }
}

impl Default for AboutScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Page<AppState> for AboutScreen {
    fn id(&self) -> ScreenId {
        ABOUT
    }

    fn control(&mut self) -> &mut dyn Control {
        &mut self.screen
    }

    fn activate(&mut self, cx: &mut PageContext<'_, AppState>) {
        let (ctx, state) = cx.parts();
        let text = about_text(state);
        if let Some(label) = self.screen.base_mut().controls_mut().label_mut(BODY) {
            label.set_text(text);
        }
        self.screen.draw_control(BODY, ctx);
    }

    fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, AppState>) -> bool {
        self.screen.dispatch_key(key, cx.render()).is_handled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::system::StaticSource;
    use std::path::PathBuf;

    #[test]
    fn test_about_names_the_settings_file() {
        let mut state = AppState::new(Box::new(StaticSource::default()), Settings::default(), None);
        assert!(about_text(&state).contains("Settings: not saved"));

        state.settings_path = Some(PathBuf::from("/tmp/taskcon.json"));
        let text = about_text(&state);
        assert!(text.contains("/tmp/taskcon.json"));
        assert!(text.starts_with(&format!("taskcon {}", env!("CARGO_PKG_VERSION"))));
    }
}
