//! Key reference page.

use crossterm::event::KeyEvent;

use crate::commands::Command;
use crate::state::AppState;
use crate::ui::{Control, Dock, Label, Page, PageContext, Screen, ScreenId, Widget};

use super::{status_bar, title_bar, HELP};

const HELP_TEXT: &str = "\
Keys

  Up/Down PgUp/PgDn Home/End   move the selection
  F3 or /                      filter by name, command or user
  F4                           clear the filter
  F5 or >, <                   next or previous sort column
  r                            reverse the sort order
  t                            show or hide kernel threads
  F9 or k                      send SIGTERM to the selected process
  F2 or s                      setup
  F1, h or ?                   this page
  a                            about taskcon
  Esc or q                     close the current page
  F10 or Ctrl+C                quit

Message boxes

  Left/Right                   choose a button
  Enter                        confirm the focused button
  Esc                          cancel";

pub struct HelpScreen {
    screen: Screen<Command>,
}

impl HelpScreen {
    pub fn new() -> Self {
        let mut screen = Screen::new(HELP);
        screen.base_mut().controls_mut().add_range([
            Widget::from(title_bar("title", " taskcon help")),
            Widget::from(
                Label::new("body", HELP_TEXT).with_dock(Dock::Between { top: 2, bottom: 1 }),
            ),
            Widget::from(status_bar("status", "Esc back")),
        ]);
        HelpScreen { screen }
    }
}

impl Default for HelpScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Page<AppState> for HelpScreen {
    fn id(&self) -> ScreenId {
        HELP
    }

    fn control(&mut self) -> &mut dyn Control {
        &mut self.screen
    }

    fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, AppState>) -> bool {
        self.screen.dispatch_key(key, cx.render()).is_handled()
    }
}
