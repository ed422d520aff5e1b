//! Real terminal console on top of crossterm.
//!
//! This is the only place in the crate with terminal side effects. Output is
//! queued into a buffered stdout and pushed on `flush`. The first write error
//! is remembered and reported by the next `flush`, so widget code can draw
//! without threading `io::Result` through every call.

use std::io::{self, BufWriter, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{queue, ExecutableCommand};
use unicode_width::UnicodeWidthStr;

use super::Console;

// ============================================================================
// TERMINAL LIFECYCLE
// ============================================================================

/// Put the terminal into raw mode on the alternate screen.
fn setup_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    Ok(())
}

/// Restore the terminal to normal mode.
fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(ResetColor)?;
    stdout.execute(Show)?;
    disable_raw_mode()?;
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restoration
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// CONSOLE
// ============================================================================

/// Console bound to the process's stdout and keyboard.
///
/// Created with [`CrosstermConsole::open`]; the terminal is restored when the
/// value is dropped.
pub struct CrosstermConsole {
    out: BufWriter<Stdout>,
    size: (u16, u16),
    cursor: (u16, u16),
    foreground: Color,
    background: Color,
    pending: Option<KeyEvent>,
    deferred: Option<io::Error>,
}

impl CrosstermConsole {
    /// Enter raw mode and the alternate screen.
    pub fn open() -> io::Result<Self> {
        install_panic_hook();
        setup_terminal()?;
        let size = terminal::size()?;
        tracing::debug!(columns = size.0, rows = size.1, "terminal opened");

        Ok(CrosstermConsole {
            out: BufWriter::new(io::stdout()),
            size,
            cursor: (0, 0),
            foreground: Color::Reset,
            background: Color::Reset,
            pending: None,
            deferred: None,
        })
    }

    /// Remember the first failure; later ones are usually the same broken pipe.
    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.deferred.is_none() {
                tracing::warn!(error = %e, "terminal write failed");
                self.deferred = Some(e);
            }
        }
    }

    /// Fold a raw event into console state. Returns the key if it is a press.
    fn absorb(&mut self, event: Event) -> Option<KeyEvent> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(key),
            Event::Resize(columns, rows) => {
                self.size = (columns, rows);
                None
            }
            _ => None, // ignore mouse, focus, paste
        }
    }
}

impl Console for CrosstermConsole {
    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn key_available(&mut self) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        while event::poll(Duration::ZERO)? {
            let raw = event::read()?;
            if let Some(key) = self.absorb(raw) {
                self.pending = Some(key);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        if let Some(key) = self.pending.take() {
            return Ok(key);
        }
        loop {
            let raw = event::read()?;
            if let Some(key) = self.absorb(raw) {
                return Ok(key);
            }
        }
    }

    fn foreground(&self) -> Color {
        self.foreground
    }

    fn background(&self) -> Color {
        self.background
    }

    fn set_foreground(&mut self, colour: Color) {
        if colour != self.foreground {
            self.foreground = colour;
            let result = queue!(self.out, SetForegroundColor(colour));
            self.record(result);
        }
    }

    fn set_background(&mut self, colour: Color) {
        if colour != self.background {
            self.background = colour;
            let result = queue!(self.out, SetBackgroundColor(colour));
            self.record(result);
        }
    }

    fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    fn set_cursor(&mut self, column: u16, row: u16) {
        self.cursor = (column, row);
        let result = queue!(self.out, MoveTo(column, row));
        self.record(result);
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        let result = if visible {
            queue!(self.out, Show)
        } else {
            queue!(self.out, Hide)
        };
        self.record(result);
    }

    fn write_str(&mut self, text: &str) {
        let advance = u16::try_from(text.width()).unwrap_or(u16::MAX);
        self.cursor.0 = self.cursor.0.saturating_add(advance);
        let result = queue!(self.out, Print(text));
        self.record(result);
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        self.out.flush()
    }
}

impl Drop for CrosstermConsole {
    fn drop(&mut self) {
        let _ = self.out.flush();
        if let Err(e) = restore_terminal() {
            tracing::error!(error = %e, "failed to restore terminal");
        }
    }
}
