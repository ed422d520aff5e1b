//! Child controls: the closed set of widget variants and their container.
//!
//! Screens and panels compose [`Widget`] values. The set is closed on
//! purpose-built variants so lookups by name can hand back the concrete type
//! (`list_view_mut`, `input_box_mut`, ...) without downcasting.

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

use super::control::{Control, ControlBase, RenderContext};
use super::input_box::InputBox;
use super::label::{Label, Panel};
use super::list_view::ListView;

// ============================================================================
// WIDGET
// ============================================================================

/// A child control.
#[derive(Debug)]
pub enum Widget {
    Label(Label),
    Panel(Panel),
    InputBox(InputBox),
    ListView(ListView),
}

macro_rules! each_widget {
    ($widget:expr, $inner:ident => $body:expr) => {
        match $widget {
            Widget::Label($inner) => $body,
            Widget::Panel($inner) => $body,
            Widget::InputBox($inner) => $body,
            Widget::ListView($inner) => $body,
        }
    };
}

impl Widget {
    pub fn name(&self) -> &str {
        self.base().name()
    }

    pub fn as_label_mut(&mut self) -> Option<&mut Label> {
        match self {
            Widget::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_panel_mut(&mut self) -> Option<&mut Panel> {
        match self {
            Widget::Panel(panel) => Some(panel),
            _ => None,
        }
    }

    pub fn as_input_box_mut(&mut self) -> Option<&mut InputBox> {
        match self {
            Widget::InputBox(input) => Some(input),
            _ => None,
        }
    }

    pub fn as_list_view(&self) -> Option<&ListView> {
        match self {
            Widget::ListView(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_view_mut(&mut self) -> Option<&mut ListView> {
        match self {
            Widget::ListView(list) => Some(list),
            _ => None,
        }
    }
}

impl Control for Widget {
    fn base(&self) -> &ControlBase {
        each_widget!(self, w => w.base())
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        each_widget!(self, w => w.base_mut())
    }

    fn min_size(&self) -> (u16, u16) {
        each_widget!(self, w => w.min_size())
    }

    fn load(&mut self) {
        each_widget!(self, w => w.load())
    }

    fn unload(&mut self) {
        each_widget!(self, w => w.unload())
    }

    fn resize(&mut self, parent: Rect) {
        each_widget!(self, w => w.resize(parent))
    }

    fn draw(&mut self, ctx: &mut RenderContext<'_>) {
        each_widget!(self, w => w.draw(ctx))
    }

    fn key_pressed(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        each_widget!(self, w => w.key_pressed(key, ctx))
    }

    fn clear(&mut self, ctx: &mut RenderContext<'_>) {
        each_widget!(self, w => w.clear(ctx))
    }
}

impl From<Label> for Widget {
    fn from(label: Label) -> Self {
        Widget::Label(label)
    }
}

impl From<Panel> for Widget {
    fn from(panel: Panel) -> Self {
        Widget::Panel(panel)
    }
}

impl From<InputBox> for Widget {
    fn from(input: InputBox) -> Self {
        Widget::InputBox(input)
    }
}

impl From<ListView> for Widget {
    fn from(list: ListView) -> Self {
        Widget::ListView(list)
    }
}

// ============================================================================
// CONTROL COLLECTION
// ============================================================================

/// Ordered children of a control.
///
/// Order is painter's order and the default tab order. Mutations keep the
/// children in step with the owner: controls added to a loaded owner are
/// loaded immediately, removed controls are unloaded, and any structural
/// change marks the owner for re-layout on its next draw.
#[derive(Debug, Default)]
pub struct ControlCollection {
    items: Vec<Widget>,
    owner_loaded: bool,
    needs_layout: bool,
}

impl ControlCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a control and return its index.
    pub fn add(&mut self, widget: impl Into<Widget>) -> usize {
        let mut widget = widget.into();
        if self.owner_loaded {
            widget.load();
        }
        self.items.push(widget);
        self.needs_layout = true;
        self.items.len() - 1
    }

    pub fn add_range<I>(&mut self, widgets: I)
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        for widget in widgets {
            self.add(widget);
        }
    }

    /// Replace the control at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, widget: impl Into<Widget>) -> Option<Widget> {
        let slot = self.items.get_mut(index)?;
        let mut widget = widget.into();
        if self.owner_loaded {
            widget.load();
        }
        let mut old = std::mem::replace(slot, widget);
        old.unload();
        self.needs_layout = true;
        Some(old)
    }

    /// Remove the first control called `name`.
    pub fn remove(&mut self, name: &str) -> Option<Widget> {
        let index = self.index_of(name)?;
        self.remove_at(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Widget> {
        if index >= self.items.len() {
            return None;
        }
        let mut widget = self.items.remove(index);
        widget.unload();
        self.needs_layout = true;
        Some(widget)
    }

    /// Unload and drop every child.
    pub fn clear(&mut self) {
        for widget in &mut self.items {
            widget.unload();
        }
        self.items.clear();
        self.needs_layout = true;
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|w| w.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&Widget> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Widget> {
        self.items.get_mut(index)
    }

    pub fn find(&self, name: &str) -> Option<&Widget> {
        self.items.iter().find(|w| w.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.items.iter_mut().find(|w| w.name() == name)
    }

    pub fn label_mut(&mut self, name: &str) -> Option<&mut Label> {
        self.find_mut(name)?.as_label_mut()
    }

    pub fn input_box_mut(&mut self, name: &str) -> Option<&mut InputBox> {
        self.find_mut(name)?.as_input_box_mut()
    }

    pub fn list_view(&self, name: &str) -> Option<&ListView> {
        self.find(name)?.as_list_view()
    }

    pub fn list_view_mut(&mut self, name: &str) -> Option<&mut ListView> {
        self.find_mut(name)?.as_list_view_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Widget> {
        self.items.iter_mut()
    }

    // ------------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------------

    /// Name of the focused child, if any.
    pub fn focused(&self) -> Option<&str> {
        self.items
            .iter()
            .find(|w| w.base().is_focused())
            .map(|w| w.name())
    }

    /// Give focus to the child called `name` and take it from all others.
    pub fn focus(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        for widget in &mut self.items {
            let is_target = widget.name() == name;
            widget.base_mut().set_focused(is_target);
        }
        true
    }

    /// Move focus to the next visible tab stop, by tab index then insertion order.
    ///
    /// Returns false when there is nowhere else to go.
    pub fn focus_next(&mut self) -> bool {
        let mut stops: Vec<(u16, usize)> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, w)| w.base().tab_stop() && w.base().is_visible())
            .map(|(i, w)| (w.base().tab_index(), i))
            .collect();
        stops.sort();

        let current = stops
            .iter()
            .position(|&(_, i)| self.items[i].base().is_focused());
        let next = match current {
            Some(pos) if stops.len() > 1 => (pos + 1) % stops.len(),
            Some(_) => return false,
            None if stops.is_empty() => return false,
            None => 0,
        };

        let target = stops[next].1;
        for (i, widget) in self.items.iter_mut().enumerate() {
            widget.base_mut().set_focused(i == target);
        }
        true
    }

    // ------------------------------------------------------------------------
    // Lifecycle plumbing (driven by the owner)
    // ------------------------------------------------------------------------

    pub(crate) fn set_owner_loaded(&mut self, loaded: bool) {
        self.owner_loaded = loaded;
    }

    pub(crate) fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub(crate) fn load_all(&mut self) {
        for widget in &mut self.items {
            widget.load();
        }
    }

    pub(crate) fn unload_all(&mut self) {
        for widget in &mut self.items {
            widget.unload();
        }
    }

    pub(crate) fn resize_all(&mut self, parent: Rect) {
        for widget in &mut self.items {
            widget.resize(parent);
        }
        self.needs_layout = false;
    }

    pub(crate) fn draw_all(&mut self, ctx: &mut RenderContext<'_>) {
        for widget in &mut self.items {
            widget.draw(ctx);
        }
    }

    /// Offer the key to each visible child in order.
    ///
    /// Tab stops only receive keys while focused.
    pub(crate) fn key_pressed(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        for widget in &mut self.items {
            let base = widget.base();
            if !base.is_visible() || (base.tab_stop() && !base.is_focused()) {
                continue;
            }
            if widget.key_pressed(key, ctx) {
                return true;
            }
        }
        false
    }
}

// ============================================================================
// TESTS
// ============================================================================
