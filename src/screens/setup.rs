//! Settings page.
//!
//! Booleans toggle and the sort column cycles in place. The refresh interval
//! is typed into an input line at the bottom of the page.

use crossterm::event::{KeyCode, KeyEvent};

use crate::commands::Command;
use crate::settings::{description_of, SettingKind, KNOWN_SETTINGS};
use crate::state::AppState;
use crate::types::SortColumn;
use crate::ui::{
    Control, Dock, InputBox, InputResult, KeyOutcome, ListView, ListViewColumnHeader,
    ListViewItem, ListViewItemCollection, Page, PageContext, RenderContext, Screen, ScreenId,
    Widget,
};

use super::{is_plain, present, status_bar, title_bar, SETUP};

const TITLE: &str = "title";
const LIST: &str = "settings";
const EDIT: &str = "edit";
const STATUS: &str = "status";

const HINTS: &str = "Enter change  d default  F2 save  Esc back";

pub struct SetupScreen {
    screen: Screen<Command>,
    /// Key being typed into the edit line.
    editing: Option<&'static str>,
    notice: Option<String>,
}

impl SetupScreen {
    pub fn new() -> Self {
        let mut screen = Screen::new(SETUP);
        let list = ListView::new(LIST)
            .with_dock(Dock::Between { top: 1, bottom: 1 })
            .with_column(ListViewColumnHeader::new("Setting", 24))
            .with_column(ListViewColumnHeader::new("Value", 12))
            .with_column(ListViewColumnHeader::new("Key", 0));
        let mut edit = InputBox::new(EDIT, "").with_dock(Dock::Bottom(1));
        edit.base_mut().set_visible(false);

        screen.base_mut().controls_mut().add_range([
            Widget::from(title_bar(TITLE, " taskcon setup")),
            Widget::from(edit),
            Widget::from(status_bar(STATUS, HINTS)),
            Widget::from(list),
        ]);

        SetupScreen {
            screen,
            editing: None,
            notice: None,
        }
    }

    fn populate(&mut self, state: &AppState, ctx: &mut RenderContext<'_>) {
        let items: ListViewItemCollection = KNOWN_SETTINGS
            .iter()
            .enumerate()
            .map(|(i, (key, _, _, description))| {
                let value = state.settings.get(key).unwrap_or("");
                ListViewItem::from_texts([*description, value, *key]).with_tag(i as u64)
            })
            .collect();

        let status = match &self.notice {
            Some(notice) => notice.clone(),
            None if state.settings.is_dirty() => format!("Modified  |  {HINTS}"),
            None => HINTS.to_string(),
        };

        let controls = self.screen.base_mut().controls_mut();
        if let Some(list) = controls.list_view_mut(LIST) {
            list.set_items(items);
        }
        if let Some(label) = controls.label_mut(STATUS) {
            label.set_text(status);
        }
        self.screen.draw_control(LIST, ctx);
        self.screen.draw_control(STATUS, ctx);
    }

    fn selected(&self) -> Option<(&'static str, SettingKind, &'static str)> {
        let list = self.screen.base().controls().list_view(LIST)?;
        let index = usize::try_from(list.selected_item()?.tag).ok()?;
        let (key, kind, default, _) = KNOWN_SETTINGS.get(index)?;
        Some((*key, *kind, *default))
    }

    fn execute(&mut self, command: Command, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        let outcome = command.execute(state);
        self.notice = present(&mut self.screen, outcome, ctx);
        self.populate(state, ctx);
    }

    fn begin_edit(&mut self, key: &'static str, state: &AppState, ctx: &mut RenderContext<'_>) {
        self.editing = Some(key);
        let title = format!("{}:", description_of(key));
        let controls = self.screen.base_mut().controls_mut();
        if let Some(status) = controls.label_mut(STATUS) {
            status.base_mut().set_visible(false);
        }
        if let Some(input) = controls.input_box_mut(EDIT) {
            input.set_title(title);
            input.set_text(state.settings.get(key).unwrap_or(""));
            input.base_mut().set_visible(true);
        }
        self.screen.draw_control(EDIT, ctx);
        self.screen.set_cursor_visible(true);
        ctx.console().set_cursor_visible(true);
    }

    fn end_edit(&mut self, ctx: &mut RenderContext<'_>) {
        self.editing = None;
        let controls = self.screen.base_mut().controls_mut();
        if let Some(input) = controls.input_box_mut(EDIT) {
            input.base_mut().set_visible(false);
        }
        if let Some(status) = controls.label_mut(STATUS) {
            status.base_mut().set_visible(true);
        }
        self.screen.set_cursor_visible(false);
        ctx.console().set_cursor_visible(false);
    }

    fn edit_key(
        &mut self,
        key: &KeyEvent,
        setting: &'static str,
        state: &mut AppState,
        ctx: &mut RenderContext<'_>,
    ) {
        self.screen.dispatch_key(key, ctx);
        let Some(input) = self.screen.base_mut().controls_mut().input_box_mut(EDIT) else {
            return;
        };
        let (result, value) = (input.result(), input.text());
        match result {
            InputResult::Enter => {
                self.end_edit(ctx);
                self.execute(Command::SetSetting { key: setting, value }, state, ctx);
            }
            InputResult::Cancel => {
                self.end_edit(ctx);
                self.populate(state, ctx);
            }
            InputResult::None => {}
        }
    }

    /// Enter or Space on the selected row.
    fn change_selected(&mut self, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        let Some((key, kind, _)) = self.selected() else {
            return;
        };
        match kind {
            SettingKind::Bool => self.execute(Command::ToggleSetting(key), state, ctx),
            SettingKind::Sort => {
                let current = state
                    .settings
                    .get(key)
                    .and_then(SortColumn::parse)
                    .unwrap_or_default();
                let value = current.next().as_str().to_string();
                self.execute(Command::SetSetting { key, value }, state, ctx);
            }
            SettingKind::Millis => self.begin_edit(key, state, ctx),
        }
    }
}

impl Default for SetupScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Page<AppState> for SetupScreen {
    fn id(&self) -> ScreenId {
        SETUP
    }

    fn control(&mut self) -> &mut dyn Control {
        &mut self.screen
    }

    fn activate(&mut self, cx: &mut PageContext<'_, AppState>) {
        self.notice = None;
        let (ctx, state) = cx.parts();
        self.populate(state, ctx);
    }

    fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, AppState>) -> bool {
        let (ctx, state) = cx.parts();
        if let Some(setting) = self.editing {
            self.edit_key(key, setting, state, ctx);
            return true;
        }

        match self.screen.dispatch_key(key, ctx) {
            KeyOutcome::Confirmed(command) => {
                self.execute(command, state, ctx);
                return true;
            }
            KeyOutcome::Handled => return true,
            KeyOutcome::Unhandled => {}
        }
        if !is_plain(key) {
            return false;
        }

        self.notice = None;
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => self.change_selected(state, ctx),
            KeyCode::Char('d') => {
                if let Some((key, _, default)) = self.selected() {
                    let value = default.to_string();
                    self.execute(Command::SetSetting { key, value }, state, ctx);
                }
            }
            KeyCode::F(2) => self.execute(Command::SaveSettings, state, ctx),
            _ => return false,
        }
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================
