//! Console boundary: the character-grid terminal the widget framework draws on.
//!
//! Widgets never talk to crossterm directly. They issue cursor, colour and
//! write calls against [`Console`], which has two implementations:
//! - [`CrosstermConsole`]: the real terminal (raw mode, alternate screen)
//! - [`MemoryConsole`]: an in-memory cell grid used by tests
//!
//! Drawing calls are infallible. I/O errors are deferred by the terminal
//! implementation and surface from `flush`, `key_available` or `read_key`.

mod memory;
mod terminal;

use std::io;
use std::ops::{Deref, DerefMut};

use crossterm::event::KeyEvent;
use crossterm::style::Color;

pub use memory::MemoryConsole;
pub use terminal::CrosstermConsole;

// ============================================================================
// CONSOLE TRAIT
// ============================================================================

/// The terminal operations the widget framework consumes.
pub trait Console {
    /// Current window size as (columns, rows).
    fn size(&self) -> (u16, u16);

    /// Non-blocking check for a pending key press.
    fn key_available(&mut self) -> io::Result<bool>;

    /// Read the next key press, blocking until one arrives.
    fn read_key(&mut self) -> io::Result<KeyEvent>;

    fn foreground(&self) -> Color;
    fn background(&self) -> Color;
    fn set_foreground(&mut self, colour: Color);
    fn set_background(&mut self, colour: Color);

    /// Cursor position as (column, row).
    fn cursor(&self) -> (u16, u16);
    fn set_cursor(&mut self, column: u16, row: u16);
    fn set_cursor_visible(&mut self, visible: bool);

    /// Write at the cursor. The cursor advances by the number of characters.
    fn write_str(&mut self, text: &str);

    fn write_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.write_str(ch.encode_utf8(&mut buf));
    }

    /// Push buffered output to the device, reporting any deferred error.
    fn flush(&mut self) -> io::Result<()>;
}

// ============================================================================
// HELPERS
// ============================================================================

/// Set both colours in one call.
pub fn set_colours(console: &mut dyn Console, foreground: Color, background: Color) {
    console.set_foreground(foreground);
    console.set_background(background);
}

/// Write `count` copies of `ch` starting at (column, row).
pub fn fill_row(console: &mut dyn Console, column: u16, row: u16, count: u16, ch: char) {
    if count == 0 {
        return;
    }
    console.set_cursor(column, row);
    let line: String = std::iter::repeat_n(ch, usize::from(count)).collect();
    console.write_str(&line);
}

/// Colours applied for the lifetime of the guard.
///
/// The previous foreground and background are captured on creation and put
/// back on drop, whichever path the caller leaves by.
pub struct ColourScope<'a> {
    console: &'a mut dyn Console,
    saved: (Color, Color),
}

impl<'a> ColourScope<'a> {
    pub fn new(console: &'a mut dyn Console, foreground: Color, background: Color) -> Self {
        let saved = (console.foreground(), console.background());
        set_colours(console, foreground, background);
        Self { console, saved }
    }
}

impl<'a> Deref for ColourScope<'a> {
    type Target = dyn Console + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.console
    }
}

impl<'a> DerefMut for ColourScope<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.console
    }
}

impl Drop for ColourScope<'_> {
    fn drop(&mut self) {
        let (foreground, background) = self.saved;
        set_colours(self.console, foreground, background);
    }
}
