//! Static text line and plain container controls.

use crossterm::style::Color;
use ratatui::layout::{Alignment, Rect};

use crate::console::set_colours;

use super::control::{Control, ControlBase, Dock, RenderContext};
use super::text::align_text;

// ============================================================================
// LABEL
// ============================================================================

/// One or more lines of text painted across the control's width.
///
/// Lines beyond the control's height are not shown.
#[derive(Debug)]
pub struct Label {
    base: ControlBase,
    text: String,
    alignment: Alignment,
}

impl Label {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Label {
            base: ControlBase::new(name),
            text: text.into(),
            alignment: Alignment::Left,
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

    pub fn with_colours(mut self, foreground: Color, background: Color) -> Self {
        self.base.foreground = foreground;
        self.base.background = background;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Callers redraw when ready.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Control for Label {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn on_draw(&mut self, ctx: &mut RenderContext<'_>) {
        let console = ctx.console();
        let bounds = self.base.bounds();
        set_colours(console, self.base.foreground, self.base.background);
        let mut lines = self.text.lines();
        for dy in 0..bounds.height {
            let line = lines.next().unwrap_or("");
            let padded = align_text(line, usize::from(bounds.width), self.alignment);
            self.base.write_at(console, 0, dy, &padded);
        }
    }
}

// ============================================================================
// PANEL
// ============================================================================

/// Background-filled container for other controls.
#[derive(Debug)]
pub struct Panel {
    base: ControlBase,
}

impl Panel {
    pub fn new(name: impl Into<String>) -> Self {
        Panel {
            base: ControlBase::new(name),
        }
    }

    pub fn with_dock(mut self, dock: Dock) -> Self {
        self.base.set_dock(dock);
        self
    }

    pub fn with_colours(mut self, foreground: Color, background: Color) -> Self {
        self.base.foreground = foreground;
        self.base.background = background;
        self
    }
}

impl Control for Panel {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn min_size(&self) -> (u16, u16) {
        (0, 0)
    }

    fn on_draw(&mut self, ctx: &mut RenderContext<'_>) {
        self.base.fill(ctx.console());
    }
}

// ============================================================================
// TESTS
// ============================================================================
