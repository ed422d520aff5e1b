//! The control capability: geometry, colours, children and lifecycle.
//!
//! Every widget owns a [`ControlBase`] and implements [`Control`]. The trait's
//! provided methods (`load`, `resize`, `draw`, `key_pressed`, ...) implement
//! the lifecycle protocol once; widgets customise it through the `on_*` hooks.
//!
//! Lifecycle: constructed inert → `load` → any number of `resize` / `draw` /
//! `key_pressed` → `unload`. A control that is not loaded ignores everything
//! except `load`.

use crossterm::event::{KeyCode, KeyEvent};
use crossterm::style::Color;
use ratatui::layout::Rect;

use crate::console::{fill_row, set_colours, Console};

use super::collection::ControlCollection;
use super::text;
use super::theme;

// ============================================================================
// RENDER CONTEXT
// ============================================================================

/// Console handle passed down a draw or key-dispatch call tree.
///
/// Carries the render-suppression flag: while a screen shows a modal box,
/// its other controls are handed a suppressed context and skip painting.
pub struct RenderContext<'a> {
    console: &'a mut dyn Console,
    suppressed: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(console: &'a mut dyn Console) -> Self {
        RenderContext {
            console,
            suppressed: false,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }

    /// Shorter-lived context with the same suppression state.
    pub fn reborrow(&mut self) -> RenderContext<'_> {
        RenderContext {
            console: &mut *self.console,
            suppressed: self.suppressed,
        }
    }

    /// Shorter-lived context with suppression forced to `suppressed`.
    pub fn with_suppression(&mut self, suppressed: bool) -> RenderContext<'_> {
        RenderContext {
            console: &mut *self.console,
            suppressed,
        }
    }
}

// ============================================================================
// DOCKING
// ============================================================================

/// How a control derives its rectangle from its parent's on resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dock {
    /// Keep whatever rectangle was set explicitly.
    #[default]
    Fixed,
    /// Take the whole parent rectangle.
    Fill,
    /// Strip of `n` rows along the parent's top edge.
    Top(u16),
    /// Strip of `n` rows along the parent's bottom edge.
    Bottom(u16),
    /// Full width, leaving `top` rows above and `bottom` rows below.
    Between { top: u16, bottom: u16 },
    /// Box of the given size centred in the parent, shrunk to fit.
    Centre { width: u16, height: u16 },
}

impl Dock {
    /// Compute the rectangle for a control currently at `current`.
    pub fn resolve(self, current: Rect, parent: Rect) -> Rect {
        match self {
            Dock::Fixed => current,
            Dock::Fill => parent,
            Dock::Top(rows) => Rect::new(parent.x, parent.y, parent.width, rows.min(parent.height)),
            Dock::Bottom(rows) => {
                let rows = rows.min(parent.height);
                Rect::new(parent.x, parent.bottom() - rows, parent.width, rows)
            }
            Dock::Between { top, bottom } => {
                let top = top.min(parent.height);
                let height = parent.height.saturating_sub(top).saturating_sub(bottom);
                Rect::new(parent.x, parent.y + top, parent.width, height)
            }
            Dock::Centre { width, height } => centred(parent, width, height),
        }
    }
}

/// Rectangle of at most `width` x `height` centred in `parent`.
pub fn centred(parent: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(parent.width);
    let height = height.min(parent.height);
    Rect::new(
        parent.x + (parent.width - width) / 2,
        parent.y + (parent.height - height) / 2,
        width,
        height,
    )
}

// ============================================================================
// CONTROL BASE
// ============================================================================

/// State shared by every control.
#[derive(Debug)]
pub struct ControlBase {
    name: String,
    bounds: Rect,
    dock: Dock,
    pub foreground: Color,
    pub background: Color,
    visible: bool,
    tab_stop: bool,
    tab_index: u16,
    focused: bool,
    loaded: bool,
    controls: ControlCollection,
}

impl ControlBase {
    pub fn new(name: impl Into<String>) -> Self {
        ControlBase {
            name: name.into(),
            bounds: Rect::default(),
            dock: Dock::Fixed,
            foreground: theme::TEXT_FG,
            background: theme::TEXT_BG,
            visible: true,
            tab_stop: false,
            tab_index: 0,
            focused: false,
            loaded: false,
            controls: ControlCollection::new(),
        }
    }

    pub fn with_dock(mut self, dock: Dock) -> Self {
        self.dock = dock;
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_colours(mut self, foreground: Color, background: Color) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_tab_stop(mut self, tab_index: u16) -> Self {
        self.tab_stop = true;
        self.tab_index = tab_index;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn dock(&self) -> Dock {
        self.dock
    }

    pub fn set_dock(&mut self, dock: Dock) {
        self.dock = dock;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn tab_stop(&self) -> bool {
        self.tab_stop
    }

    pub fn set_tab_stop(&mut self, tab_stop: bool) {
        self.tab_stop = tab_stop;
    }

    pub fn tab_index(&self) -> u16 {
        self.tab_index
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn controls(&self) -> &ControlCollection {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlCollection {
        &mut self.controls
    }

    /// Paint the whole rectangle with blanks in the control's colours.
    pub fn fill(&self, console: &mut dyn Console) {
        set_colours(console, self.foreground, self.background);
        for row in self.bounds.y..self.bounds.bottom() {
            fill_row(console, self.bounds.x, row, self.bounds.width, ' ');
        }
    }

    /// Write `text` at an offset inside the rectangle, clipped to its width.
    pub fn write_at(&self, console: &mut dyn Console, dx: u16, dy: u16, text: &str) {
        if dy >= self.bounds.height || dx >= self.bounds.width {
            return;
        }
        let room = usize::from(self.bounds.width - dx);
        let (clipped, _) = text::clip(text, room);
        console.set_cursor(self.bounds.x + dx, self.bounds.y + dy);
        console.write_str(clipped);
    }
}

// ============================================================================
// CONTROL TRAIT
// ============================================================================

/// Capability shared by all widgets: load, unload, resize, draw, handle keys.
pub trait Control {
    fn base(&self) -> &ControlBase;
    fn base_mut(&mut self) -> &mut ControlBase;

    /// Smallest (width, height) the control can paint into.
    fn min_size(&self) -> (u16, u16) {
        (1, 1)
    }

    /// Terminal cursor visibility applied when this control is shown as
    /// the root of a screen.
    fn cursor_visible(&self) -> bool {
        false
    }

    fn on_load(&mut self) {}
    fn on_unload(&mut self) {}
    fn on_resize(&mut self) {}
    fn on_clear(&mut self) {}

    /// Paint the control itself. Children are painted afterwards.
    fn on_draw(&mut self, _ctx: &mut RenderContext<'_>) {}

    /// Handle a key before the children see it.
    fn on_key(&mut self, _key: &KeyEvent, _ctx: &mut RenderContext<'_>) -> bool {
        false
    }

    fn load(&mut self) {
        if self.base().is_loaded() {
            return;
        }
        self.on_load();
        let base = self.base_mut();
        base.loaded = true;
        base.controls.set_owner_loaded(true);
        base.controls.load_all();
    }

    fn unload(&mut self) {
        if !self.base().is_loaded() {
            return;
        }
        let base = self.base_mut();
        base.controls.unload_all();
        base.controls.set_owner_loaded(false);
        base.loaded = false;
        self.on_unload();
    }

    /// Recompute the rectangle from `parent`, then resize the children.
    fn resize(&mut self, parent: Rect) {
        if !self.base().is_loaded() {
            return;
        }
        let base = self.base_mut();
        base.bounds = base.dock.resolve(base.bounds, parent);
        self.on_resize();
        let base = self.base_mut();
        let bounds = base.bounds;
        base.controls.resize_all(bounds);
    }

    /// Paint self then children, unless hidden, unloaded, suppressed or too small.
    fn draw(&mut self, ctx: &mut RenderContext<'_>) {
        let base = self.base();
        if !base.is_loaded() || !base.is_visible() || ctx.is_suppressed() {
            return;
        }
        let (min_width, min_height) = self.min_size();
        let bounds = self.base().bounds();
        if bounds.width < min_width || bounds.height < min_height {
            return;
        }
        if self.base().controls.needs_layout() {
            self.base_mut().controls.resize_all(bounds);
        }
        self.on_draw(ctx);
        self.base_mut().controls.draw_all(ctx);
    }

    /// Dispatch a key: own hook first, then the children, then Tab focus cycling.
    ///
    /// Returns true once some control consumed the key.
    fn key_pressed(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        let base = self.base();
        if !base.is_loaded() || !base.is_visible() {
            return false;
        }
        if self.on_key(key, ctx) {
            return true;
        }
        let controls = &mut self.base_mut().controls;
        if controls.key_pressed(key, ctx) {
            return true;
        }
        if key.code == KeyCode::Tab && controls.focus_next() {
            controls.draw_all(ctx);
            return true;
        }
        false
    }

    /// Blank the control's rectangle and reset transient visual state.
    fn clear(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.base().is_loaded() || ctx.is_suppressed() {
            return;
        }
        self.base().fill(ctx.console());
        self.on_clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crate::ui::label::Label;

    #[test]
    fn test_dock_top_and_bottom_strips() {
        let parent = Rect::new(0, 0, 80, 24);
        assert_eq!(Dock::Top(1).resolve(Rect::default(), parent), Rect::new(0, 0, 80, 1));
        assert_eq!(Dock::Bottom(2).resolve(Rect::default(), parent), Rect::new(0, 22, 80, 2));
    }

    #[test]
    fn test_dock_between_leaves_header_and_footer() {
        let parent = Rect::new(0, 0, 80, 24);
        let r = Dock::Between { top: 2, bottom: 1 }.resolve(Rect::default(), parent);
        assert_eq!(r, Rect::new(0, 2, 80, 21));
    }

    #[test]
    fn test_dock_between_never_underflows() {
        let parent = Rect::new(0, 0, 10, 2);
        let r = Dock::Between { top: 3, bottom: 3 }.resolve(Rect::default(), parent);
        assert_eq!(r.height, 0);
    }

    #[test]
    fn test_centred_box_shrinks_to_parent() {
        let parent = Rect::new(0, 0, 20, 10);
        assert_eq!(centred(parent, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centred(parent, 40, 40), parent);
    }

    #[test]
    fn test_fixed_dock_keeps_bounds() {
        let current = Rect::new(3, 4, 5, 6);
        assert_eq!(Dock::Fixed.resolve(current, Rect::new(0, 0, 80, 24)), current);
    }

    #[test]
    fn test_unloaded_control_does_not_draw() {
        let mut console = MemoryConsole::new(10, 1);
        let mut label = Label::new("title", "hello").with_dock(Dock::Fill);
        label.resize(Rect::new(0, 0, 10, 1));
        label.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.write_count(), 0);
    }

    #[test]
    fn test_suppressed_context_skips_drawing() {
        let mut console = MemoryConsole::new(10, 1);
        let mut label = Label::new("title", "hello").with_dock(Dock::Fill);
        label.load();
        label.resize(Rect::new(0, 0, 10, 1));
        let mut ctx = RenderContext::new(&mut console);
        label.draw(&mut ctx.with_suppression(true));
        assert_eq!(console.write_count(), 0);
    }

    #[test]
    fn test_load_is_idempotent_and_unload_reverses() {
        let mut label = Label::new("title", "hello");
        label.load();
        label.load();
        assert!(label.base().is_loaded());
        label.unload();
        assert!(!label.base().is_loaded());
        label.unload();
        assert!(!label.base().is_loaded());
    }

    #[test]
    fn test_write_at_clips_to_width() {
        let mut console = MemoryConsole::new(10, 1);
        let base = ControlBase::new("x").with_bounds(Rect::new(2, 0, 3, 1));
        base.write_at(&mut console, 0, 0, "abcdef");
        assert_eq!(console.row_text(0), "  abc     ");
    }
}
