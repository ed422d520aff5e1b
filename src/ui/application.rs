//! Screen stack and the main input loop.
//!
//! Structure:
//! - [`ScreenApplicationContext`]: the stack of screen ids (pure state)
//! - [`Page`]: what a registered screen provides to the loop
//! - [`PageContext`]: console, shared state and queued navigation for a page call
//! - [`ScreenApplication`]: registration, showing screens, the loop itself
//!
//! Pages never switch screens directly. They queue a request on their
//! [`PageContext`] and the application applies it once the page returns.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use tracing::{debug, info};

use crate::console::Console;
use crate::error::UiError;

use super::control::{Control, RenderContext};

/// Application-defined screen identifier.
pub type ScreenId = &'static str;

/// Delay between loop iterations when no key is pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// CONTEXT (screen stack)
// ============================================================================

/// Result of assigning the owner screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerChange {
    /// The screen was already on top.
    Unchanged,
    /// The screen was pushed; `previous` must be closed by the caller.
    Pushed { previous: Option<ScreenId> },
}

/// Stack of shown screens, most recent on top. Only the top is active.
#[derive(Debug, Default)]
pub struct ScreenApplicationContext {
    stack: Vec<ScreenId>,
}

impl ScreenApplicationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active screen.
    pub fn owner(&self) -> Option<ScreenId> {
        self.stack.last().copied()
    }

    /// Make `id` the owner. Re-assigning the current top changes nothing.
    pub fn set_owner(&mut self, id: ScreenId) -> OwnerChange {
        let previous = self.owner();
        if previous == Some(id) {
            return OwnerChange::Unchanged;
        }
        self.stack.push(id);
        OwnerChange::Pushed { previous }
    }

    pub fn pop(&mut self) -> Option<ScreenId> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn screens(&self) -> &[ScreenId] {
        &self.stack
    }
}

// ============================================================================
// PAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    Show(ScreenId),
    Close,
}

/// Everything a page may touch during a callback.
pub struct PageContext<'a, C> {
    render: RenderContext<'a>,
    state: &'a mut C,
    navigation: Vec<Navigation>,
}

impl<'a, C> PageContext<'a, C> {
    fn new(console: &'a mut dyn Console, state: &'a mut C) -> Self {
        PageContext {
            render: RenderContext::new(console),
            state,
            navigation: Vec::new(),
        }
    }

    pub fn render(&mut self) -> &mut RenderContext<'a> {
        &mut self.render
    }

    pub fn state(&mut self) -> &mut C {
        &mut *self.state
    }

    /// Split borrow of the render context and the shared state.
    pub fn parts(&mut self) -> (&mut RenderContext<'a>, &mut C) {
        (&mut self.render, &mut *self.state)
    }

    /// Console size as (columns, rows).
    pub fn console_size(&mut self) -> (u16, u16) {
        self.render.console().size()
    }

    /// Ask for `id` to become the active screen.
    pub fn show(&mut self, id: ScreenId) {
        self.navigation.push(Navigation::Show(id));
    }

    /// Ask for the active screen to be closed and popped.
    pub fn close(&mut self) {
        self.navigation.push(Navigation::Close);
    }

    fn into_navigation(self) -> Vec<Navigation> {
        self.navigation
    }
}

/// A registered screen. `C` is the state shared by all pages.
pub trait Page<C> {
    fn id(&self) -> ScreenId;

    /// The root control, normally a [`super::screen::Screen`].
    fn control(&mut self) -> &mut dyn Control;

    /// Called once the screen has been shown and drawn.
    fn activate(&mut self, _cx: &mut PageContext<'_, C>) {}

    /// Handle a key. Return false to let the application apply its defaults
    /// (Escape or q closes the screen).
    fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, C>) -> bool;

    /// Called on loop iterations that had no key to dispatch.
    fn tick(&mut self, _cx: &mut PageContext<'_, C>) {}
}

// ============================================================================
// APPLICATION
// ============================================================================

/// Owns the console, the shared state and every registered page.
pub struct ScreenApplication<T: Console, C> {
    console: T,
    state: C,
    pages: HashMap<ScreenId, Box<dyn Page<C>>>,
    context: ScreenApplicationContext,
    last_size: (u16, u16),
    poll_interval: Duration,
    started: bool,
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::F(10) => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn is_close_key(key: &KeyEvent) -> bool {
    let plain = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    matches!(key.code, KeyCode::Esc | KeyCode::Char('q' | 'Q')) && plain
}

impl<T: Console, C> ScreenApplication<T, C> {
    pub fn new(console: T, state: C) -> Self {
        let last_size = console.size();
        ScreenApplication {
            console,
            state,
            pages: HashMap::new(),
            context: ScreenApplicationContext::new(),
            last_size,
            poll_interval: DEFAULT_POLL_INTERVAL,
            started: false,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn console(&self) -> &T {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut T {
        &mut self.console
    }

    pub fn state(&self) -> &C {
        &self.state
    }

    pub fn context(&self) -> &ScreenApplicationContext {
        &self.context
    }

    pub fn into_parts(self) -> (T, C) {
        (self.console, self.state)
    }

    pub fn register_screen(&mut self, page: Box<dyn Page<C>>) -> Result<(), UiError> {
        let id = page.id();
        if self.pages.contains_key(id) {
            return Err(UiError::DuplicateScreen(id));
        }
        debug!(screen = id, "registered screen");
        self.pages.insert(id, page);
        Ok(())
    }

    /// Make a registered screen the active one.
    pub fn show_screen(&mut self, id: &str) -> Result<(), UiError> {
        let Some((&id, _)) = self.pages.get_key_value(id) else {
            return Err(UiError::UnregisteredScreen(id.to_string()));
        };
        let follow_up = self.set_owner(id)?;
        self.drain_navigation(follow_up)
    }

    /// Show `id` and run the loop until quit or the last screen closes.
    ///
    /// Every screen still on the stack is closed before returning, even when
    /// the loop fails.
    pub fn run(&mut self, id: &str) -> Result<(), UiError> {
        if self.started {
            return Err(UiError::AlreadyRunning);
        }
        self.started = true;
        info!(screen = id, "application loop starting");

        let result = self.show_screen(id).and_then(|()| self.main_loop());
        self.shutdown();
        if let Err(err) = self.console.flush() {
            debug!(error = %err, "final flush failed");
        }
        info!("application loop finished");
        result
    }

    fn main_loop(&mut self) -> Result<(), UiError> {
        while self.step()? {
            if !self.console.key_available()? {
                thread::sleep(self.poll_interval);
            }
        }
        Ok(())
    }

    /// One loop iteration. Returns false when the loop should end.
    pub(crate) fn step(&mut self) -> Result<bool, UiError> {
        if self.context.is_empty() {
            return Ok(false);
        }

        let size = self.console.size();
        if size != self.last_size {
            debug!(columns = size.0, rows = size.1, "console resized");
            self.refit_owner();
            self.console.flush()?;
            return Ok(true);
        }

        if self.console.key_available()? {
            let key = self.console.read_key()?;
            if is_quit_key(&key) {
                info!("quit requested");
                return Ok(false);
            }
            self.dispatch_key(&key)?;
        } else {
            self.tick_owner()?;
        }

        self.console.flush()?;
        Ok(!self.context.is_empty())
    }

    fn dispatch_key(&mut self, key: &KeyEvent) -> Result<(), UiError> {
        let Some(id) = self.context.owner() else {
            return Ok(());
        };
        let Some(page) = self.pages.get_mut(id) else {
            return Err(UiError::UnregisteredScreen(id.to_string()));
        };

        let mut cx = PageContext::new(&mut self.console, &mut self.state);
        let handled = page.key_pressed(key, &mut cx);
        let mut navigation = cx.into_navigation();

        if !handled && is_close_key(key) {
            navigation.push(Navigation::Close);
        }
        self.drain_navigation(navigation)
    }

    fn tick_owner(&mut self) -> Result<(), UiError> {
        let Some(id) = self.context.owner() else {
            return Ok(());
        };
        let Some(page) = self.pages.get_mut(id) else {
            return Ok(());
        };
        let mut cx = PageContext::new(&mut self.console, &mut self.state);
        page.tick(&mut cx);
        let navigation = cx.into_navigation();
        self.drain_navigation(navigation)
    }

    /// Apply queued navigation, including requests made by pages while
    /// being shown.
    fn drain_navigation(&mut self, mut queue: Vec<Navigation>) -> Result<(), UiError> {
        queue.reverse();
        while let Some(request) = queue.pop() {
            let follow_up = match request {
                Navigation::Show(id) => {
                    if !self.pages.contains_key(id) {
                        return Err(UiError::UnregisteredScreen(id.to_string()));
                    }
                    self.set_owner(id)?
                }
                Navigation::Close => self.close_owner(),
            };
            queue.extend(follow_up.into_iter().rev());
            if self.context.is_empty() {
                break;
            }
        }
        Ok(())
    }

    fn set_owner(&mut self, id: ScreenId) -> Result<Vec<Navigation>, UiError> {
        match self.context.set_owner(id) {
            OwnerChange::Unchanged => Ok(Vec::new()),
            OwnerChange::Pushed { previous } => {
                if let Some(previous) = previous {
                    self.close_page(previous);
                }
                info!(screen = id, depth = self.context.len(), "screen shown");
                Ok(self.show_page(id))
            }
        }
    }

    /// Pop and close the owner, then show whatever is underneath.
    fn close_owner(&mut self) -> Vec<Navigation> {
        let Some(id) = self.context.pop() else {
            return Vec::new();
        };
        self.close_page(id);
        info!(screen = id, depth = self.context.len(), "screen closed");
        match self.context.owner() {
            Some(next) => self.show_page(next),
            None => Vec::new(),
        }
    }

    fn close_page(&mut self, id: ScreenId) {
        if let Some(page) = self.pages.get_mut(id) {
            page.control().unload();
        }
    }

    /// Load, clear, fit, draw and activate a page.
    fn show_page(&mut self, id: ScreenId) -> Vec<Navigation> {
        let Some(page) = self.pages.get_mut(id) else {
            return Vec::new();
        };
        self.last_size = self.console.size();
        let (columns, rows) = self.last_size;

        let control = page.control();
        control.load();
        let mut ctx = RenderContext::new(&mut self.console);
        control.clear(&mut ctx);
        control.resize(Rect::new(0, 0, columns, rows));
        control.draw(&mut ctx);

        let cursor_visible = control.cursor_visible();
        self.console.set_cursor_visible(cursor_visible);
        let mut cx = PageContext::new(&mut self.console, &mut self.state);
        page.activate(&mut cx);
        cx.into_navigation()
    }

    fn refit_owner(&mut self) {
        self.last_size = self.console.size();
        let Some(id) = self.context.owner() else {
            return;
        };
        let Some(page) = self.pages.get_mut(id) else {
            return;
        };
        let (columns, rows) = self.last_size;
        let control = page.control();
        let mut ctx = RenderContext::new(&mut self.console);
        control.resize(Rect::new(0, 0, columns, rows));
        control.clear(&mut ctx);
        control.draw(&mut ctx);
    }

    /// Close and pop every screen, top first.
    fn shutdown(&mut self) {
        while let Some(id) = self.context.pop() {
            self.close_page(id);
            debug!(screen = id, "screen closed on shutdown");
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
    use crate::ui::control::{ControlBase, Dock};
    use crate::ui::label::Label;
    use crate::ui::screen::Screen;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Root control that records its lifecycle.
    struct Probe {
        base: ControlBase,
        log: Log,
    }

    impl Control for Probe {
        fn base(&self) -> &ControlBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ControlBase {
            &mut self.base
        }
        fn on_load(&mut self) {
            self.log.borrow_mut().push(format!("load {}", self.base.name()));
        }
        fn on_unload(&mut self) {
            self.log.borrow_mut().push(format!("unload {}", self.base.name()));
        }
        fn on_resize(&mut self) {
            let b = self.base.bounds();
            self.log
                .borrow_mut()
                .push(format!("resize {} {}x{}", self.base.name(), b.width, b.height));
        }
    }

    struct TestPage {
        id: ScreenId,
        root: Probe,
        /// Key that asks for another screen.
        jump: Option<(char, ScreenId)>,
    }

    impl TestPage {
        fn boxed(id: ScreenId, log: &Log) -> Box<dyn Page<u32>> {
            Self::jumping(id, log, None)
        }

        fn jumping(id: ScreenId, log: &Log, jump: Option<(char, ScreenId)>) -> Box<dyn Page<u32>> {
            let mut base = ControlBase::new(id).with_dock(Dock::Fill);
            base.controls_mut()
                .add(Label::new("title", id).with_dock(Dock::Top(1)));
            Box::new(TestPage {
                id,
                root: Probe {
                    base,
                    log: Rc::clone(log),
                },
                jump,
            })
        }
    }

    impl Page<u32> for TestPage {
        fn id(&self) -> ScreenId {
            self.id
        }

        fn control(&mut self) -> &mut dyn Control {
            &mut self.root
        }

        fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, u32>) -> bool {
            *cx.state() += 1;
            match (key.code, self.jump) {
                (KeyCode::Char(c), Some((trigger, target))) if c == trigger => {
                    cx.show(target);
                    true
                }
                _ => false,
            }
        }

        fn tick(&mut self, _cx: &mut PageContext<'_, u32>) {
            self.root.log.borrow_mut().push(format!("tick {}", self.id));
        }
    }

    /// Page whose root is a real `Screen`.
    struct EditorPage {
        screen: Screen<()>,
    }

    impl Page<u32> for EditorPage {
        fn id(&self) -> ScreenId {
            "editor"
        }

        fn control(&mut self) -> &mut dyn Control {
            &mut self.screen
        }

        fn key_pressed(&mut self, _key: &KeyEvent, _cx: &mut PageContext<'_, u32>) -> bool {
            false
        }
    }

    fn app_with(log: &Log, ids: &[ScreenId]) -> ScreenApplication<MemoryConsole, u32> {
        let mut app = ScreenApplication::new(MemoryConsole::new(40, 10), 0)
            .with_poll_interval(Duration::ZERO);
        for id in ids {
            app.register_screen(TestPage::boxed(id, log)).unwrap();
        }
        app
    }

    fn count(log: &Log, entry: &str) -> usize {
        log.borrow().iter().filter(|e| *e == entry).count()
    }

    #[test]
    fn test_context_ignores_reassigning_top() {
        let mut context = ScreenApplicationContext::new();
        assert_eq!(context.set_owner("a"), OwnerChange::Pushed { previous: None });
        assert_eq!(context.set_owner("a"), OwnerChange::Unchanged);
        assert_eq!(context.set_owner("b"), OwnerChange::Pushed { previous: Some("a") });
        assert_eq!(context.screens(), &["a", "b"]);
    }

    #[test]
    fn test_showing_same_screen_twice_shows_once() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        app.show_screen("a").unwrap();
        app.show_screen("a").unwrap();
        assert_eq!(count(&log, "load a"), 1);
        assert_eq!(count(&log, "resize a 40x10"), 1);
        assert_eq!(app.context().len(), 1);
    }

    #[test]
    fn test_show_draws_the_screen() {
        let log = Log::default();
        let mut app = app_with(&log, &["main"]);
        app.show_screen("main").unwrap();
        assert!(app.console().row_text(0).starts_with("main"));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        let err = app.register_screen(TestPage::boxed("a", &log)).unwrap_err();
        assert!(matches!(err, UiError::DuplicateScreen("a")));
    }

    #[test]
    fn test_unregistered_screen_is_rejected() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        let err = app.show_screen("nope").unwrap_err();
        assert!(matches!(err, UiError::UnregisteredScreen(ref id) if id == "nope"));
    }

    #[test]
    fn test_closing_last_screen_ends_loop() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        app.console_mut().push_code(KeyCode::Esc);
        app.run("a").unwrap();
        assert!(app.context().is_empty());
        assert_eq!(count(&log, "load a"), 1);
        assert_eq!(count(&log, "unload a"), 1);
    }

    #[test]
    fn test_run_twice_is_an_error() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        app.console_mut().push_code(KeyCode::F(10));
        app.run("a").unwrap();
        assert!(matches!(app.run("a"), Err(UiError::AlreadyRunning)));
    }

    #[test]
    fn test_quit_closes_whole_stack_once() {
        let log = Log::default();
        let mut app = app_with(&log, &["a", "b"]);
        app.show_screen("a").unwrap();
        app.show_screen("b").unwrap();
        app.console_mut().push_code(KeyCode::F(10));
        app.run("b").unwrap();

        assert_eq!(count(&log, "load a"), 1);
        assert_eq!(count(&log, "unload a"), 1);
        assert_eq!(count(&log, "load b"), 1);
        assert_eq!(count(&log, "unload b"), 1);
    }

    #[test]
    fn test_escape_returns_to_previous_screen() {
        let log = Log::default();
        let mut app = app_with(&log, &["a", "b"]);
        app.show_screen("a").unwrap();
        app.show_screen("b").unwrap();
        app.console_mut().push_code(KeyCode::Char('q'));

        assert!(app.step().unwrap());
        assert_eq!(app.context().owner(), Some("a"));
        assert_eq!(count(&log, "load a"), 2);
        assert_eq!(count(&log, "unload b"), 1);
    }

    #[test]
    fn test_page_navigation_is_applied_after_dispatch() {
        let log = Log::default();
        let mut app = ScreenApplication::new(MemoryConsole::new(40, 10), 0u32)
            .with_poll_interval(Duration::ZERO);
        app.register_screen(TestPage::jumping("a", &log, Some(('h', "help"))))
            .unwrap();
        app.register_screen(TestPage::boxed("help", &log)).unwrap();
        app.show_screen("a").unwrap();
        app.console_mut().push_code(KeyCode::Char('h'));

        assert!(app.step().unwrap());
        assert_eq!(app.context().screens(), &["a", "help"]);
        assert_eq!(*app.state(), 1);
    }

    #[test]
    fn test_resize_refits_without_consuming_keys() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        app.show_screen("a").unwrap();
        app.console_mut().resize(60, 20);
        app.console_mut().push_code(KeyCode::Char('x'));

        assert!(app.step().unwrap());
        assert_eq!(count(&log, "resize a 60x20"), 1);
        assert_eq!(app.console().pending_keys(), 1);
        assert_eq!(*app.state(), 0);
    }

    #[test]
    fn test_shown_screen_sets_cursor_visibility() {
        let log = Log::default();
        let mut app = app_with(&log, &["a"]);
        app.register_screen(Box::new(EditorPage {
            screen: Screen::new("editor").with_cursor_visible(true),
        }))
        .unwrap();

        app.show_screen("a").unwrap();
        assert!(!app.console().is_cursor_visible());
        app.show_screen("editor").unwrap();
        assert!(app.console().is_cursor_visible());
    }

    #[test]
    fn test_idle_iteration_ticks_owner() {
        let log = Log::default();
        let mut app = app_with(&log, &["a", "b"]);
        app.show_screen("a").unwrap();
        app.show_screen("b").unwrap();
        assert!(app.step().unwrap());
        assert_eq!(count(&log, "tick b"), 1);
        assert_eq!(count(&log, "tick a"), 0);
    }

    #[test]
    fn test_handled_escape_does_not_close() {
        let log = Log::default();
        let mut app = ScreenApplication::new(MemoryConsole::new(40, 10), 0u32)
            .with_poll_interval(Duration::ZERO);
        app.register_screen(TestPage::jumping("a", &log, Some(('q', "b"))))
            .unwrap();
        app.register_screen(TestPage::boxed("b", &log)).unwrap();
        app.show_screen("a").unwrap();
        app.console_mut().push_code(KeyCode::Char('q'));

        assert!(app.step().unwrap());
        assert_eq!(app.context().owner(), Some("b"));
    }
}
