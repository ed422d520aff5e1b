//! Single-line edit buffer with a cursor and insert/overwrite modes.
//!
//! Every operation reports whether anything changed. Hitting a bound is a
//! normal outcome in a keyboard UI, so there are no errors here; callers use
//! the boolean to decide whether to repaint.

use super::text::column_of;

/// Editable line of text.
///
/// Invariant: `cursor <= chars.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    chars: Vec<char>,
    cursor: usize,
    insert_mode: bool,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Empty buffer in insert mode.
    pub fn new() -> Self {
        TextBuffer {
            chars: Vec::new(),
            cursor: 0,
            insert_mode: true,
        }
    }

    /// Buffer holding `text` with the cursor at the end.
    pub fn with_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        TextBuffer {
            chars,
            cursor,
            insert_mode: true,
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Terminal column of the cursor, counting wide characters as two.
    pub fn cursor_column(&self) -> usize {
        column_of(&self.chars, self.cursor)
    }

    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    pub fn set_insert_mode(&mut self, insert: bool) {
        self.insert_mode = insert;
    }

    /// Flip between insert and overwrite. Returns the new mode.
    pub fn toggle_insert_mode(&mut self) -> bool {
        self.insert_mode = !self.insert_mode;
        self.insert_mode
    }

    /// Insert or overwrite at the cursor and advance it.
    ///
    /// Control characters are refused. Overwriting at the end appends.
    pub fn add(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        if self.insert_mode || self.cursor == self.chars.len() {
            self.chars.insert(self.cursor, ch);
        } else {
            self.chars[self.cursor] = ch;
        }
        self.cursor += 1;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor == self.chars.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Backspace: remove the character before the cursor.
    pub fn move_backwards(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Remove the character under the cursor; the cursor stays put.
    pub fn delete(&mut self) -> bool {
        if self.cursor == self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }
}

// ============================================================================
// TESTS
// ============================================================================
