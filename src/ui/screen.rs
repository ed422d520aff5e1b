//! Full-terminal page with a modal message box slot.
//!
//! The box is not one of the screen's children. While it is visible the
//! screen's other controls get a suppressed render context, so background
//! updates cannot paint over the box. Key dispatch offers the key to the
//! children first and to the box only when they leave it unhandled.
//!
//! The Ok action is a plain value of type `A`. When the box is confirmed the
//! screen hands it back from [`Screen::dispatch_key`] and the owning page
//! performs it.

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

use super::control::{centred, Control, ControlBase, Dock, RenderContext};
use super::message_box::{Buttons, MessageBox, MessageResult};
use super::theme;

/// What a key did to a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome<A> {
    /// Nobody consumed the key.
    Unhandled,
    Handled,
    /// The message box closed with Ok and carried this action.
    Confirmed(A),
}

impl<A> KeyOutcome<A> {
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyOutcome::Unhandled)
    }
}

#[derive(Debug)]
pub struct Screen<A> {
    base: ControlBase,
    cursor_visible: bool,
    message_box: MessageBox,
    on_ok: Option<A>,
}

impl<A> Screen<A> {
    pub fn new(name: impl Into<String>) -> Self {
        Screen {
            base: ControlBase::new(name)
                .with_dock(Dock::Fill)
                .with_colours(theme::TEXT_FG, theme::TEXT_BG),
            cursor_visible: false,
            message_box: MessageBox::new(),
            on_ok: None,
        }
    }

    pub fn with_cursor_visible(mut self, visible: bool) -> Self {
        self.cursor_visible = visible;
        self
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    pub fn message_box(&self) -> &MessageBox {
        &self.message_box
    }

    /// True while the message box is showing.
    pub fn is_modal(&self) -> bool {
        self.message_box.is_visible()
    }

    /// Open the message box. `on_ok` is returned from `dispatch_key` if the
    /// user confirms; it is dropped on Cancel.
    pub fn show_message_box(
        &mut self,
        title: &str,
        text: &str,
        buttons: Buttons,
        on_ok: Option<A>,
        ctx: &mut RenderContext<'_>,
    ) {
        tracing::debug!(screen = self.base.name(), title, "message box shown");
        self.on_ok = on_ok;
        self.message_box.show(title, text, buttons);
        self.layout_message_box();
        self.message_box.draw(ctx);
    }

    /// Route a key: children, then the message box if it is showing.
    pub fn dispatch_key(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> KeyOutcome<A> {
        if !self.base.is_loaded() {
            return KeyOutcome::Unhandled;
        }

        let modal = self.is_modal();
        let suppressed = modal || ctx.is_suppressed();
        if self.key_pressed(key, &mut ctx.with_suppression(suppressed)) {
            return KeyOutcome::Handled;
        }
        if !modal {
            return KeyOutcome::Unhandled;
        }

        self.message_box.key_pressed(key, ctx);
        let result = self.message_box.result();
        if result == MessageResult::None {
            return KeyOutcome::Handled;
        }

        tracing::debug!(screen = self.base.name(), ?result, "message box closed");
        self.message_box.hide();
        let action = self.on_ok.take();
        self.clear(ctx);
        self.draw(ctx);

        match (result, action) {
            (MessageResult::Ok, Some(action)) => KeyOutcome::Confirmed(action),
            _ => KeyOutcome::Handled,
        }
    }

    /// Redraw one child, honouring the modal state.
    pub fn draw_control(&mut self, name: &str, ctx: &mut RenderContext<'_>) {
        let suppressed = self.is_modal() || ctx.is_suppressed();
        if let Some(widget) = self.base.controls_mut().find_mut(name) {
            widget.draw(&mut ctx.with_suppression(suppressed));
        }
    }

    /// Centre the box, leaving room for its shadow.
    fn layout_message_box(&mut self) {
        let bounds = self.base.bounds();
        let area = Rect::new(
            bounds.x,
            bounds.y,
            bounds.width.saturating_sub(1),
            bounds.height.saturating_sub(1),
        );
        let (width, height) = self.message_box.preferred_size();
        self.message_box
            .base_mut()
            .set_bounds(centred(area, width, height));
    }
}

impl<A> Control for Screen<A> {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    fn on_load(&mut self) {
        self.message_box.load();
    }

    fn on_unload(&mut self) {
        self.message_box.hide();
        self.message_box.unload();
        self.on_ok = None;
    }

    fn on_resize(&mut self) {
        self.layout_message_box();
    }

    /// Background and children, or only the box while it is showing.
    fn draw(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.base.is_loaded() || !self.base.is_visible() || ctx.is_suppressed() {
            return;
        }
        let modal = self.is_modal();
        if !modal {
            self.base.fill(ctx.console());
        }
        let bounds = self.base.bounds();
        let controls = self.base.controls_mut();
        if controls.needs_layout() {
            controls.resize_all(bounds);
        }
        controls.draw_all(&mut ctx.with_suppression(modal));
        if modal {
            self.message_box.draw(ctx);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crate::ui::input_box::InputBox;
    use crate::ui::label::Label;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Action {
        Kill(u32),
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_screen(console: &mut MemoryConsole) -> Screen<Action> {
        let mut screen = Screen::new("main");
        screen
            .base_mut()
            .controls_mut()
            .add(Label::new("title", "before").with_dock(Dock::Top(1)));
        screen.load();
        screen.resize(Rect::new(0, 0, 80, 24));
        screen.draw(&mut RenderContext::new(console));
        screen
    }

    #[test]
    fn test_confirmed_box_returns_action_and_closes() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        let mut ctx = RenderContext::new(&mut console);
        screen.show_message_box("Kill", "Kill 42?", Buttons::OkCancel, Some(Action::Kill(42)), &mut ctx);
        assert!(screen.is_modal());

        assert_eq!(screen.dispatch_key(&key(KeyCode::Enter), &mut ctx), KeyOutcome::Confirmed(Action::Kill(42)));
        assert!(!screen.is_modal());
    }

    #[test]
    fn test_cancelled_box_drops_action() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        let mut ctx = RenderContext::new(&mut console);
        screen.show_message_box("Kill", "Kill 42?", Buttons::OkCancel, Some(Action::Kill(42)), &mut ctx);

        assert_eq!(screen.dispatch_key(&key(KeyCode::Esc), &mut ctx), KeyOutcome::Handled);
        assert!(!screen.is_modal());
        assert_eq!(screen.dispatch_key(&key(KeyCode::Enter), &mut ctx), KeyOutcome::Unhandled);
    }

    #[test]
    fn test_ok_without_action_is_just_handled() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        let mut ctx = RenderContext::new(&mut console);
        screen.show_message_box("Error", "failed", Buttons::Ok, None, &mut ctx);
        assert_eq!(screen.dispatch_key(&key(KeyCode::Enter), &mut ctx), KeyOutcome::Handled);
    }

    #[test]
    fn test_open_box_swallows_unmapped_keys() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        let mut ctx = RenderContext::new(&mut console);
        screen.show_message_box("t", "x", Buttons::OkCancel, None, &mut ctx);
        assert_eq!(screen.dispatch_key(&key(KeyCode::Char('z')), &mut ctx), KeyOutcome::Handled);
        assert!(screen.is_modal());
    }

    #[test]
    fn test_children_see_keys_before_the_box() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        screen
            .base_mut()
            .controls_mut()
            .add(InputBox::new("filter", "").with_dock(Dock::Bottom(1)));
        let mut ctx = RenderContext::new(&mut console);
        screen.show_message_box("t", "x", Buttons::OkCancel, None, &mut ctx);
        screen.dispatch_key(&key(KeyCode::Char('a')), &mut ctx);

        let input = screen.base_mut().controls_mut().input_box_mut("filter").unwrap();
        assert_eq!(input.text(), "a");
        assert!(screen.is_modal());
    }

    #[test]
    fn test_background_is_not_repainted_under_the_box() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        {
            let mut ctx = RenderContext::new(&mut console);
            screen.show_message_box("t", "x", Buttons::Ok, None, &mut ctx);
        }
        screen.base_mut().controls_mut().label_mut("title").unwrap().set_text("after");
        screen.draw_control("title", &mut RenderContext::new(&mut console));
        assert!(console.row_text(0).starts_with("before"));

        screen.dispatch_key(&key(KeyCode::Enter), &mut RenderContext::new(&mut console));
        assert!(console.row_text(0).starts_with("after"));
    }

    #[test]
    fn test_resize_recentres_the_box() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        screen.show_message_box("t", "x", Buttons::Ok, None, &mut RenderContext::new(&mut console));
        let before = screen.message_box().base().bounds();

        screen.resize(Rect::new(0, 0, 120, 40));
        let after = screen.message_box().base().bounds();
        assert_eq!(after.width, before.width);
        assert!(after.x > before.x);
        assert!(after.y > before.y);
    }

    #[test]
    fn test_unload_discards_open_box() {
        let mut console = MemoryConsole::new(80, 24);
        let mut screen = loaded_screen(&mut console);
        screen.show_message_box("t", "x", Buttons::Ok, Some(Action::Kill(1)), &mut RenderContext::new(&mut console));
        screen.unload();
        assert!(!screen.is_modal());
        assert!(!screen.message_box().base().is_loaded());
    }
}
