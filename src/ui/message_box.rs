//! Modal message box with Ok or Ok/Cancel buttons.
//!
//! Layout, top to bottom: title bar, blank, up to [`MAX_TEXT_LINES`] centred
//! text lines, spacer, buttons, key hint, blank. A one-cell drop shadow sits
//! below and to the right. While visible the box swallows every key it is
//! offered and redraws after each one.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Alignment, Rect};

use crate::console::{fill_row, set_colours, Console};

use super::control::{Control, ControlBase, RenderContext};
use super::text::{align_text, display_width};
use super::theme;

/// Text lines shown at most; the rest are dropped.
pub const MAX_TEXT_LINES: usize = 10;

/// Narrowest box drawn, shadow excluded.
const MIN_WIDTH: u16 = 30;

/// Rows around the text: title, blank, spacer, buttons, hint, bottom blank.
const CHROME_ROWS: u16 = 6;

const OK_LABEL: &str = "Ok";
const CANCEL_LABEL: &str = "Cancel";
const BUTTON_GAP: usize = 3;

/// Which buttons the box offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Buttons {
    #[default]
    Ok,
    OkCancel,
}

/// How the box was dismissed. None while still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageResult {
    #[default]
    None,
    Ok,
    Cancel,
}

#[derive(Debug)]
pub struct MessageBox {
    base: ControlBase,
    title: String,
    text: String,
    buttons: Buttons,
    ok_focused: bool,
    result: MessageResult,
}

impl Default for MessageBox {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBox {
    /// Hidden, empty box.
    pub fn new() -> Self {
        let mut base =
            ControlBase::new("message_box").with_colours(theme::DIALOG_FG, theme::DIALOG_BG);
        base.set_visible(false);
        MessageBox {
            base,
            title: String::new(),
            text: String::new(),
            buttons: Buttons::Ok,
            ok_focused: true,
            result: MessageResult::None,
        }
    }

    /// Reset content and state and make the box visible.
    pub fn show(&mut self, title: &str, text: &str, buttons: Buttons) {
        self.title = title.to_string();
        self.text = text.to_string();
        self.buttons = buttons;
        self.ok_focused = true;
        self.result = MessageResult::None;
        self.base.set_visible(true);
    }

    pub fn hide(&mut self) {
        self.base.set_visible(false);
    }

    pub fn is_visible(&self) -> bool {
        self.base.is_visible()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    pub fn ok_focused(&self) -> bool {
        self.ok_focused
    }

    pub fn result(&self) -> MessageResult {
        self.result
    }

    fn visible_lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().take(MAX_TEXT_LINES)
    }

    fn hint(&self) -> &'static str {
        match self.buttons {
            Buttons::Ok => "Enter close",
            Buttons::OkCancel => "Left/Right choose  Enter confirm  Esc cancel",
        }
    }

    fn button_row_width(&self) -> usize {
        let ok = display_width(OK_LABEL) + 4;
        match self.buttons {
            Buttons::Ok => ok,
            Buttons::OkCancel => ok + BUTTON_GAP + display_width(CANCEL_LABEL) + 4,
        }
    }

    /// Size the box wants for its current content, shadow excluded.
    pub fn preferred_size(&self) -> (u16, u16) {
        let widest = self
            .visible_lines()
            .map(display_width)
            .chain([
                display_width(&self.title),
                self.button_row_width(),
                display_width(self.hint()),
            ])
            .max()
            .unwrap_or(0);
        let width = u16::try_from(widest + 4).unwrap_or(u16::MAX).max(MIN_WIDTH);
        let lines = self.visible_lines().count() as u16;
        (width, lines + CHROME_ROWS)
    }

    fn draw_shadow(&self, console: &mut dyn Console) {
        let bounds = self.base.bounds();
        let (columns, rows) = console.size();
        let shadow = Rect::new(bounds.x + 1, bounds.y + 1, bounds.width, bounds.height)
            .intersection(Rect::new(0, 0, columns, rows));
        set_colours(console, theme::DIALOG_FG, theme::SHADOW_BG);
        for row in shadow.y..shadow.bottom() {
            fill_row(console, shadow.x, row, shadow.width, ' ');
        }
    }

    fn draw_button(&self, console: &mut dyn Console, label: &str, focused: bool) {
        let (foreground, background) = if focused {
            (theme::BUTTON_FOCUS_FG, theme::BUTTON_FOCUS_BG)
        } else {
            (self.base.foreground, self.base.background)
        };
        set_colours(console, foreground, background);
        console.write_str("[ ");

        let mut highlighted = false;
        for ch in label.chars() {
            if focused && !highlighted && ch != ' ' {
                console.set_foreground(theme::HOTKEY_FG);
                console.write_char(ch);
                console.set_foreground(foreground);
                highlighted = true;
            } else {
                console.write_char(ch);
            }
        }
        console.write_str(" ]");
    }

    fn draw_buttons(&self, console: &mut dyn Console, dy: u16) {
        let bounds = self.base.bounds();
        let slack = usize::from(bounds.width).saturating_sub(self.button_row_width());
        let column = bounds.x + (slack / 2) as u16;
        console.set_cursor(column, bounds.y + dy);

        self.draw_button(console, OK_LABEL, self.ok_focused);
        if self.buttons == Buttons::OkCancel {
            set_colours(console, self.base.foreground, self.base.background);
            console.write_str(&" ".repeat(BUTTON_GAP));
            self.draw_button(console, CANCEL_LABEL, !self.ok_focused);
        }
    }
}

impl Control for MessageBox {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn min_size(&self) -> (u16, u16) {
        (MIN_WIDTH / 2, CHROME_ROWS + 1)
    }

    fn on_draw(&mut self, ctx: &mut RenderContext<'_>) {
        let console = ctx.console();
        let bounds = self.base.bounds();
        let inner = usize::from(bounds.width);

        self.draw_shadow(console);
        self.base.fill(console);

        // Title bar
        set_colours(console, theme::DIALOG_TITLE_FG, theme::DIALOG_TITLE_BG);
        self.base
            .write_at(console, 0, 0, &align_text(&self.title, inner, Alignment::Center));

        // Text, clipped to the rows between title and buttons
        set_colours(console, self.base.foreground, self.base.background);
        let text_rows = bounds.height.saturating_sub(CHROME_ROWS);
        for (i, line) in self.visible_lines().take(usize::from(text_rows)).enumerate() {
            let text = align_text(line, inner.saturating_sub(4), Alignment::Center);
            self.base.write_at(console, 2, 2 + i as u16, &text);
        }

        let buttons_row = bounds.height - 3;
        self.draw_buttons(console, buttons_row);

        set_colours(console, theme::DIM_FG, self.base.background);
        self.base.write_at(
            console,
            0,
            buttons_row + 1,
            &align_text(self.hint(), inner, Alignment::Center),
        );
        set_colours(console, self.base.foreground, self.base.background);
    }

    fn on_key(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        self.result = MessageResult::None;

        match key.code {
            KeyCode::Left | KeyCode::Char('o' | 'O' | 'y' | 'Y') => self.ok_focused = true,
            KeyCode::Right | KeyCode::Char('c' | 'C' | 'n' | 'N') => {
                if self.buttons == Buttons::OkCancel {
                    self.ok_focused = false;
                }
            }
            KeyCode::Enter => {
                self.result = if self.ok_focused {
                    MessageResult::Ok
                } else {
                    MessageResult::Cancel
                };
            }
            KeyCode::Esc => self.result = MessageResult::Cancel,
            _ => {}
        }

        self.draw(ctx);
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crossterm::event::KeyModifiers;

    fn open_box(buttons: Buttons) -> MessageBox {
        let mut mb = MessageBox::new();
        mb.load();
        mb.show("Confirm", "Kill process 42?", buttons);
        let (w, h) = mb.preferred_size();
        mb.base_mut().set_bounds(Rect::new(2, 2, w, h));
        mb
    }

    fn press(mb: &mut MessageBox, console: &mut MemoryConsole, code: KeyCode) -> bool {
        let mut ctx = RenderContext::new(console);
        mb.key_pressed(&KeyEvent::new(code, KeyModifiers::NONE), &mut ctx)
    }

    #[test]
    fn test_ok_only_box_never_moves_focus() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::Ok);
        for code in [KeyCode::Right, KeyCode::Char('c'), KeyCode::Char('n'), KeyCode::Char('C')] {
            press(&mut mb, &mut console, code);
            assert!(mb.ok_focused());
        }
        press(&mut mb, &mut console, KeyCode::Enter);
        assert_eq!(mb.result(), MessageResult::Ok);
    }

    #[test]
    fn test_right_then_enter_cancels() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        press(&mut mb, &mut console, KeyCode::Right);
        press(&mut mb, &mut console, KeyCode::Enter);
        assert_eq!(mb.result(), MessageResult::Cancel);
    }

    #[test]
    fn test_left_then_enter_confirms() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        press(&mut mb, &mut console, KeyCode::Char('n'));
        press(&mut mb, &mut console, KeyCode::Left);
        press(&mut mb, &mut console, KeyCode::Enter);
        assert_eq!(mb.result(), MessageResult::Ok);
    }

    #[test]
    fn test_escape_always_cancels() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        press(&mut mb, &mut console, KeyCode::Esc);
        assert_eq!(mb.result(), MessageResult::Cancel);
    }

    #[test]
    fn test_unmapped_letter_is_swallowed_without_result() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        assert!(press(&mut mb, &mut console, KeyCode::Char('z')));
        assert_eq!(mb.result(), MessageResult::None);
    }

    #[test]
    fn test_y_and_o_refocus_ok() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        press(&mut mb, &mut console, KeyCode::Right);
        assert!(!mb.ok_focused());
        press(&mut mb, &mut console, KeyCode::Char('y'));
        assert!(mb.ok_focused());
        press(&mut mb, &mut console, KeyCode::Char('C'));
        press(&mut mb, &mut console, KeyCode::Char('O'));
        assert!(mb.ok_focused());
    }

    #[test]
    fn test_draws_title_text_and_buttons() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        mb.draw(&mut RenderContext::new(&mut console));
        assert!(console.contains("Confirm"));
        assert!(console.contains("Kill process 42?"));
        assert!(console.contains("[ Ok ]   [ Cancel ]"));
    }

    #[test]
    fn test_focused_button_highlights_first_letter() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        mb.draw(&mut RenderContext::new(&mut console));
        let row = mb.base().bounds().bottom() - 3;
        let line = console.row_text(row);
        let ok_col = line.find("Ok").unwrap() as u16;
        let cancel_col = line.find("Cancel").unwrap() as u16;
        assert_eq!(console.cell(ok_col, row).foreground, theme::HOTKEY_FG);
        assert_ne!(console.cell(cancel_col, row).foreground, theme::HOTKEY_FG);
    }

    #[test]
    fn test_focus_change_is_painted_by_the_key_itself() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::OkCancel);
        press(&mut mb, &mut console, KeyCode::Right);

        let row = mb.base().bounds().bottom() - 3;
        let line = console.row_text(row);
        let ok_col = line.find("Ok").unwrap() as u16;
        let cancel_col = line.find("Cancel").unwrap() as u16;
        assert_eq!(console.cell(cancel_col, row).foreground, theme::HOTKEY_FG);
        assert_ne!(console.cell(ok_col, row).foreground, theme::HOTKEY_FG);
    }

    #[test]
    fn test_overflow_lines_are_not_shown() {
        let mut mb = MessageBox::new();
        let text: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        mb.show("t", &text.join("\n"), Buttons::Ok);
        let (_, h) = mb.preferred_size();
        assert_eq!(h, MAX_TEXT_LINES as u16 + CHROME_ROWS);
    }

    #[test]
    fn test_shadow_is_offset_by_one_cell() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::Ok);
        mb.draw(&mut RenderContext::new(&mut console));
        let b = mb.base().bounds();
        assert_eq!(console.cell(b.right(), b.bottom()).background, theme::SHADOW_BG);
        assert_eq!(console.cell(b.x, b.y).background, theme::DIALOG_TITLE_BG);
    }

    #[test]
    fn test_undersized_box_skips_drawing() {
        let mut console = MemoryConsole::new(80, 24);
        let mut mb = open_box(Buttons::Ok);
        mb.base_mut().set_bounds(Rect::new(0, 0, 5, 3));
        mb.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.write_count(), 0);
    }
}
