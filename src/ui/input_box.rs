//! Single-line text entry control.
//!
//! Keys edit the [`TextBuffer`] and the affected columns are rewritten in
//! place from a [`plan_repaint`] plan; the control never repaints the whole
//! field while typing. `result` reports Enter or Cancel on the key that
//! produced it and resets to None on the next key.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Color;
use ratatui::layout::{Alignment, Rect};

use crate::console::{set_colours, ColourScope, Console};

use super::control::{Control, ControlBase, Dock, RenderContext};
use super::repaint::{plan_repaint, PaintOp};
use super::text::{align_text, clip, display_width};
use super::text_buffer::TextBuffer;
use super::theme;

/// Outcome of the last key handled by an [`InputBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputResult {
    #[default]
    None,
    Enter,
    Cancel,
}

/// Title followed by an editable field on the control's first row.
#[derive(Debug)]
pub struct InputBox {
    base: ControlBase,
    title: String,
    buffer: TextBuffer,
    result: InputResult,
    field_foreground: Color,
    field_background: Color,
}

impl InputBox {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        InputBox {
            base: ControlBase::new(name),
            title: title.into(),
            buffer: TextBuffer::new(),
            result: InputResult::None,
            field_foreground: theme::INPUT_FG,
            field_background: theme::INPUT_BG,
        }
    }

    pub fn with_dock(mut self, dock: Dock) -> Self {
        self.base.set_dock(dock);
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.base.set_bounds(bounds);
        self
    }

    pub fn with_tab_stop(mut self, tab_index: u16) -> Self {
        self.base = self.base.with_tab_stop(tab_index);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replace the buffer contents, cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        let insert = self.buffer.insert_mode();
        self.buffer = TextBuffer::with_text(text);
        self.buffer.set_insert_mode(insert);
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn result(&self) -> InputResult {
        self.result
    }

    /// Column where the editable field starts, relative to the control.
    fn field_offset(&self) -> u16 {
        if self.title.is_empty() {
            0
        } else {
            u16::try_from(display_width(&self.title) + 1).unwrap_or(u16::MAX)
        }
    }

    fn field_width(&self) -> usize {
        usize::from(self.base.bounds().width.saturating_sub(self.field_offset()))
    }

    /// Absolute (column, row) of field column `column`, clamped to the field.
    fn field_position(&self, column: usize) -> (u16, u16) {
        let bounds = self.base.bounds();
        let column = column.min(self.field_width()) as u16;
        (bounds.x + self.field_offset() + column, bounds.y)
    }

    /// Replay a repaint plan starting with the cursor at field column `start`.
    fn replay(&self, console: &mut dyn Console, ops: &[PaintOp], start: usize) {
        let width = self.field_width();
        let mut pos = start;
        let (column, row) = self.field_position(pos);
        console.set_cursor(column, row);

        for op in ops {
            match op {
                PaintOp::Left(n) => pos = pos.saturating_sub(*n),
                PaintOp::Right(n) => pos += n,
                PaintOp::Write(text) => {
                    let (clipped, _) = clip(text, width.saturating_sub(pos));
                    let (column, row) = self.field_position(pos);
                    console.set_cursor(column, row);
                    console.write_str(clipped);
                    pos += display_width(text);
                }
            }
        }

        let (column, row) = self.field_position(pos);
        console.set_cursor(column, row);
    }
}

impl Control for InputBox {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn min_size(&self) -> (u16, u16) {
        (self.field_offset().saturating_add(1), 1)
    }

    fn on_clear(&mut self) {
        self.result = InputResult::None;
    }

    fn on_draw(&mut self, ctx: &mut RenderContext<'_>) {
        let console = ctx.console();
        set_colours(console, self.base.foreground, self.base.background);
        if !self.title.is_empty() {
            self.base.write_at(console, 0, 0, &format!("{} ", self.title));
        }

        let mut scoped = ColourScope::new(console, self.field_foreground, self.field_background);
        let field = align_text(&self.buffer.text(), self.field_width(), Alignment::Left);
        let (column, row) = self.field_position(0);
        scoped.set_cursor(column, row);
        scoped.write_str(&field);

        let (column, row) = self.field_position(self.buffer.cursor_column());
        scoped.set_cursor(column, row);
    }

    fn on_key(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        self.result = InputResult::None;

        let old_text = self.buffer.text();
        let old_cursor = self.buffer.cursor();
        let old_column = self.buffer.cursor_column();

        match key.code {
            KeyCode::Enter => {
                self.result = InputResult::Enter;
                return true;
            }
            KeyCode::Esc => {
                self.buffer.clear();
                self.result = InputResult::Cancel;
            }
            KeyCode::Backspace => {
                self.buffer.move_backwards();
            }
            KeyCode::Delete => {
                self.buffer.delete();
            }
            KeyCode::Left => {
                self.buffer.move_left();
            }
            KeyCode::Right => {
                self.buffer.move_right();
            }
            KeyCode::Home => while self.buffer.move_left() {},
            KeyCode::End => while self.buffer.move_right() {},
            KeyCode::Insert => {
                self.buffer.toggle_insert_mode();
                return true;
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.buffer.add(ch);
            }
            _ => return false,
        }

        if !ctx.is_suppressed() {
            let ops = plan_repaint(
                &old_text,
                old_cursor,
                &self.buffer.text(),
                self.buffer.cursor(),
            );
            let mut scoped =
                ColourScope::new(ctx.console(), self.field_foreground, self.field_background);
            self.replay(&mut *scoped, &ops, old_column);
        }
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================
