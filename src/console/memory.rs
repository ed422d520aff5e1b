//! In-memory console: a cell grid plus a scripted key queue.

use std::collections::VecDeque;
use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::Color;
use unicode_width::UnicodeWidthChar;

use super::Console;

/// Placeholder in the cell covered by the right half of a wide character.
const WIDE_TAIL: char = '\0';

/// One character cell with its colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub foreground: Color,
    pub background: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            foreground: Color::Reset,
            background: Color::Reset,
        }
    }
}

/// Console that renders into memory.
///
/// Writes past the right edge are clipped, the cursor still advances.
/// Wide characters cover two cells; control characters are stored as
/// written, one cell each, so tests can see them.
/// Keys are consumed from a queue filled with [`MemoryConsole::push_key`].
#[derive(Debug)]
pub struct MemoryConsole {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cursor: (u16, u16),
    cursor_visible: bool,
    foreground: Color,
    background: Color,
    keys: VecDeque<KeyEvent>,
    writes: usize,
}

impl MemoryConsole {
    pub fn new(width: u16, height: u16) -> Self {
        MemoryConsole {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
            cursor: (0, 0),
            cursor_visible: true,
            foreground: Color::Reset,
            background: Color::Reset,
            keys: VecDeque::new(),
            writes: 0,
        }
    }

    /// Change the window size, keeping the overlapping cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut cells = vec![Cell::default(); usize::from(width) * usize::from(height)];
        for row in 0..height.min(self.height) {
            for col in 0..width.min(self.width) {
                cells[usize::from(row) * usize::from(width) + usize::from(col)] =
                    self.cells[self.index(col, row)];
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }

    pub fn push_key(&mut self, key: KeyEvent) {
        self.keys.push_back(key);
    }

    pub fn push_code(&mut self, code: KeyCode) {
        self.push_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    /// Queue one key press per character of `text`.
    pub fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.push_code(KeyCode::Char(ch));
        }
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn cell(&self, column: u16, row: u16) -> Cell {
        if column >= self.width || row >= self.height {
            return Cell::default();
        }
        self.cells[self.index(column, row)]
    }

    /// Text of one row, trailing blanks included.
    pub fn row_text(&self, row: u16) -> String {
        (0..self.width)
            .map(|col| self.cell(col, row).ch)
            .filter(|&ch| ch != WIDE_TAIL)
            .collect()
    }

    /// Whole screen as lines with trailing blanks trimmed.
    pub fn text(&self) -> String {
        (0..self.height)
            .map(|row| self.row_text(row).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        (0..self.height).any(|row| self.row_text(row).contains(needle))
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Number of write calls issued so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn index(&self, column: u16, row: u16) -> usize {
        usize::from(row) * usize::from(self.width) + usize::from(column)
    }
}

impl Console for MemoryConsole {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn key_available(&mut self) -> io::Result<bool> {
        Ok(!self.keys.is_empty())
    }

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "key queue is empty"))
    }

    fn foreground(&self) -> Color {
        self.foreground
    }

    fn background(&self) -> Color {
        self.background
    }

    fn set_foreground(&mut self, colour: Color) {
        self.foreground = colour;
    }

    fn set_background(&mut self, colour: Color) {
        self.background = colour;
    }

    fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    fn set_cursor(&mut self, column: u16, row: u16) {
        self.cursor = (column, row);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    fn write_str(&mut self, text: &str) {
        self.writes += 1;
        let (mut col, row) = self.cursor;
        for ch in text.chars() {
            let width = if ch.is_control() { 1 } else { ch.width().unwrap_or(0) };
            if width == 0 {
                continue;
            }
            for (offset, cell_ch) in [ch, WIDE_TAIL].into_iter().take(width).enumerate() {
                let column = col.saturating_add(offset as u16);
                if column < self.width && row < self.height {
                    let idx = self.index(column, row);
                    self.cells[idx] = Cell {
                        ch: cell_ch,
                        foreground: self.foreground,
                        background: self.background,
                    };
                }
            }
            col = col.saturating_add(width as u16);
        }
        self.cursor = (col, row);
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{fill_row, ColourScope};

    #[test]
    fn test_write_advances_cursor_and_clips() {
        let mut console = MemoryConsole::new(5, 2);
        console.set_cursor(3, 1);
        console.write_str("abcd");
        assert_eq!(console.cursor(), (7, 1));
        assert_eq!(console.row_text(1), "   ab");
    }

    #[test]
    fn test_wide_chars_cover_two_cells() {
        let mut console = MemoryConsole::new(6, 1);
        console.write_str("日x");
        assert_eq!(console.cursor(), (3, 0));
        assert_eq!(console.cell(0, 0).ch, '日');
        assert_eq!(console.cell(2, 0).ch, 'x');
        assert_eq!(console.row_text(0), "日x   ");
    }

    #[test]
    fn test_colour_scope_restores_previous_colours() {
        let mut console = MemoryConsole::new(10, 1);
        console.set_foreground(Color::Grey);
        console.set_background(Color::Black);
        {
            let mut scoped = ColourScope::new(&mut console, Color::Yellow, Color::Blue);
            scoped.write_str("x");
        }
        assert_eq!(console.cell(0, 0).foreground, Color::Yellow);
        assert_eq!(console.foreground(), Color::Grey);
        assert_eq!(console.background(), Color::Black);
    }

    #[test]
    fn test_fill_row_writes_repeated_char() {
        let mut console = MemoryConsole::new(6, 1);
        fill_row(&mut console, 1, 0, 3, '-');
        assert_eq!(console.row_text(0), " ---  ");
    }

    #[test]
    fn test_resize_keeps_overlap() {
        let mut console = MemoryConsole::new(4, 2);
        console.write_str("abcd");
        console.resize(2, 3);
        assert_eq!(console.size(), (2, 3));
        assert_eq!(console.row_text(0), "ab");
    }

    #[test]
    fn test_read_key_drains_queue() {
        let mut console = MemoryConsole::new(1, 1);
        console.push_text("hi");
        assert!(console.key_available().unwrap());
        assert_eq!(console.read_key().unwrap().code, KeyCode::Char('h'));
        assert_eq!(console.read_key().unwrap().code, KeyCode::Char('i'));
        assert!(!console.key_available().unwrap());
        assert!(console.read_key().is_err());
    }
}
