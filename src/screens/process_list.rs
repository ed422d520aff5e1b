//! Main page: system summary, the process table and the filter line.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use crossterm::style::Color;
use humansize::{format_size, BINARY};
use ratatui::layout::Alignment;

use crate::commands::Command;
use crate::settings::SHOW_KERNEL_THREADS;
use crate::state::AppState;
use crate::types::{ProcessInfo, ProcessState, SortColumn, SystemSnapshot};
use crate::ui::theme;
use crate::ui::{
    Buttons, Control, Dock, InputBox, InputResult, KeyOutcome, Label, ListView,
    ListViewColumnHeader, ListViewItem, ListViewItemCollection, ListViewSubItem, Page,
    PageContext, RenderContext, Screen, ScreenId, Widget,
};

use super::{is_plain, present, status_bar, ABOUT, HELP, PROCESSES, SETUP};

const HEADER: &str = "header";
const LIST: &str = "processes";
const FILTER: &str = "filter";
const STATUS: &str = "status";

const HINTS: &str = "F1 Help  F2 Setup  F3 Filter  F5 Sort  F9 Kill  F10 Quit";

/// CPU share at which the CPU cell turns red.
const HOT_CPU_PERCENT: f64 = 50.0;

/// Column titles, in `SortColumn::ALL` order.
const COLUMNS: [(&str, u16, Alignment); 7] = [
    ("PID", 7, Alignment::Right),
    ("USER", 9, Alignment::Left),
    ("S", 1, Alignment::Left),
    ("CPU%", 6, Alignment::Right),
    ("MEM", 10, Alignment::Right),
    ("THR", 4, Alignment::Right),
    ("COMMAND", 0, Alignment::Left),
];

// ============================================================================
// FORMATTING
// ============================================================================

/// `2d 03:04:05`, or `03:04:05` under a day.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let clock = format!("{:02}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    }
}

/// Two summary lines above the table.
pub fn header_text(snapshot: &SystemSnapshot) -> String {
    let [one, five, fifteen] = snapshot.load_average;
    format!(
        "taskcon  up {}  load {one:.2} {five:.2} {fifteen:.2}\n\
         CPU {:5.1}%  Mem {} / {}  Tasks {}",
        format_uptime(snapshot.uptime),
        snapshot.cpu_percent,
        format_size(snapshot.memory_used(), BINARY),
        format_size(snapshot.memory_total, BINARY),
        snapshot.processes.len(),
    )
}

fn row_colour(process: &ProcessInfo) -> Color {
    match process.state {
        ProcessState::Zombie => theme::ZOMBIE_FG,
        ProcessState::Running => theme::RUNNING_FG,
        _ if process.is_kernel_thread() => theme::DIM_FG,
        _ => theme::TEXT_FG,
    }
}

/// One table row, tagged with the pid.
pub fn process_item(process: &ProcessInfo) -> ListViewItem {
    let fg = row_colour(process);
    let cpu_fg = if process.cpu_percent >= HOT_CPU_PERCENT {
        theme::HOT_FG
    } else {
        fg
    };
    let cell = |text: String, fg| ListViewSubItem::styled(text, fg, theme::TEXT_BG);

    ListViewItem::new()
        .with_tag(u64::from(process.pid))
        .push(cell(process.pid.to_string(), fg))
        .push(cell(process.user.clone(), fg))
        .push(cell(process.state.code().to_string(), fg))
        .push(cell(format!("{:.1}", process.cpu_percent), cpu_fg))
        .push(cell(format_size(process.resident_bytes, BINARY), fg))
        .push(cell(process.threads.to_string(), fg))
        .push(cell(process.display_command(), fg))
}

fn column_title(column: SortColumn, sorted_by: SortColumn, descending: bool) -> String {
    let index = SortColumn::ALL.iter().position(|c| *c == column).unwrap_or(0);
    let title = COLUMNS[index].0;
    match (column == sorted_by, descending) {
        (false, _) => title.to_string(),
        (true, true) => format!("{title}▼"),
        (true, false) => format!("{title}▲"),
    }
}

// ============================================================================
// PAGE
// ============================================================================

pub struct ProcessListScreen {
    screen: Screen<Command>,
    filtering: bool,
    /// One-off status line message, cleared by the next key.
    notice: Option<String>,
}

impl ProcessListScreen {
    pub fn new() -> Self {
        let mut screen = Screen::new(PROCESSES);
        let mut list = ListView::new(LIST).with_dock(Dock::Between { top: 2, bottom: 1 });
        for (title, width, alignment) in COLUMNS {
            list = list.with_column(ListViewColumnHeader::new(title, width).with_alignment(alignment));
        }
        let mut filter = InputBox::new(FILTER, "Filter:").with_dock(Dock::Bottom(1));
        filter.base_mut().set_visible(false);

        // The filter precedes the list so it sees Home and End first.
        screen.base_mut().controls_mut().add_range([
            Widget::from(Label::new(HEADER, "").with_dock(Dock::Top(2))),
            Widget::from(filter),
            Widget::from(status_bar(STATUS, HINTS)),
            Widget::from(list),
        ]);

        ProcessListScreen {
            screen,
            filtering: false,
            notice: None,
        }
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    fn status_text(&self, state: &AppState, shown: usize) -> String {
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        if state.filter.is_empty() {
            HINTS.to_string()
        } else {
            format!(
                "Filter \"{}\": {} of {}  |  {HINTS}",
                state.filter,
                shown,
                state.snapshot.processes.len()
            )
        }
    }

    /// Rebuild header, table and status from the state and repaint them.
    fn populate(&mut self, state: &AppState, ctx: &mut RenderContext<'_>) {
        let processes = state.visible_processes();
        let items: ListViewItemCollection = processes.iter().map(process_item).collect();
        let options = state.settings.display_options();
        let status = self.status_text(state, processes.len());

        let controls = self.screen.base_mut().controls_mut();
        if let Some(header) = controls.label_mut(HEADER) {
            header.set_text(header_text(&state.snapshot));
        }
        if let Some(list) = controls.list_view_mut(LIST) {
            for (i, column) in SortColumn::ALL.into_iter().enumerate() {
                if let Some(header) = list.columns_mut().get_mut(i) {
                    header.text =
                        column_title(column, options.sort_column, options.sort_descending);
                }
            }
            list.set_items(items);
        }
        if let Some(label) = controls.label_mut(STATUS) {
            label.set_text(status);
        }

        for name in [HEADER, LIST, STATUS] {
            self.screen.draw_control(name, ctx);
        }
        // Repaint last so the cursor ends up in the field.
        if self.filtering {
            self.screen.draw_control(FILTER, ctx);
        }
    }

    fn refresh(&mut self, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        if let Err(err) = state.refresh() {
            self.notice = Some(format!("Refresh failed: {err}"));
        }
        self.populate(state, ctx);
    }

    fn selected_pid(&self) -> Option<u32> {
        let list = self.screen.base().controls().list_view(LIST)?;
        u32::try_from(list.selected_item()?.tag).ok()
    }

    /// Ask for confirmation if the command needs it, otherwise run it.
    fn request(&mut self, command: Command, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        match command.confirmation(state) {
            Some((title, text)) => {
                self.screen
                    .show_message_box(&title, &text, Buttons::OkCancel, Some(command), ctx);
            }
            None => self.execute(command, state, ctx),
        }
    }

    fn execute(&mut self, command: Command, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        let outcome = command.execute(state);
        self.notice = present(&mut self.screen, outcome, ctx);
        self.populate(state, ctx);
    }

    fn begin_filter(&mut self, state: &AppState, ctx: &mut RenderContext<'_>) {
        self.filtering = true;
        let controls = self.screen.base_mut().controls_mut();
        if let Some(status) = controls.label_mut(STATUS) {
            status.base_mut().set_visible(false);
        }
        if let Some(input) = controls.input_box_mut(FILTER) {
            input.base_mut().set_visible(true);
            input.set_text(&state.filter);
        }
        self.screen.draw_control(FILTER, ctx);
        self.screen.set_cursor_visible(true);
        ctx.console().set_cursor_visible(true);
    }

    fn end_filter(&mut self, ctx: &mut RenderContext<'_>) {
        self.filtering = false;
        let controls = self.screen.base_mut().controls_mut();
        if let Some(input) = controls.input_box_mut(FILTER) {
            input.base_mut().set_visible(false);
        }
        if let Some(status) = controls.label_mut(STATUS) {
            status.base_mut().set_visible(true);
        }
        self.screen.set_cursor_visible(false);
        ctx.console().set_cursor_visible(false);
    }

    /// Keys while the filter line is open. Every key is consumed.
    fn filter_key(&mut self, key: &KeyEvent, state: &mut AppState, ctx: &mut RenderContext<'_>) {
        self.screen.dispatch_key(key, ctx);
        let Some(input) = self.screen.base_mut().controls_mut().input_box_mut(FILTER) else {
            return;
        };
        let (result, text) = (input.result(), input.text());
        match result {
            InputResult::Enter => {
                self.end_filter(ctx);
                self.execute(Command::SetFilter(text), state, ctx);
            }
            InputResult::Cancel => {
                self.end_filter(ctx);
                self.execute(Command::ClearFilter, state, ctx);
            }
            InputResult::None if text != state.filter => {
                state.filter = text;
                self.populate(state, ctx);
            }
            InputResult::None => {
                // The list scrolled; put the cursor back in the field.
                if matches!(
                    key.code,
                    KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
                ) {
                    self.screen.draw_control(FILTER, ctx);
                }
            }
        }
    }

    fn command_for(&self, key: &KeyEvent, state: &AppState) -> Option<Command> {
        let command = match key.code {
            KeyCode::F(4) => Command::ClearFilter,
            KeyCode::F(5) | KeyCode::Char('>') => Command::SortNext,
            KeyCode::Char('<') => Command::SortPrevious,
            KeyCode::Char('r') => Command::SortReverse,
            KeyCode::Char('t') => Command::ToggleSetting(SHOW_KERNEL_THREADS),
            KeyCode::F(9) | KeyCode::Char('k') => {
                let pid = self.selected_pid()?;
                let name = state
                    .snapshot
                    .find(pid)
                    .map_or_else(|| pid.to_string(), |p| p.name.clone());
                Command::Kill { pid, name }
            }
            _ => return None,
        };
        Some(command)
    }
}

impl Default for ProcessListScreen {
    fn default() -> Self {
        Self::new()
    }
}

fn navigation_target(key: &KeyEvent) -> Option<ScreenId> {
    match key.code {
        KeyCode::F(1) | KeyCode::Char('h' | '?') => Some(HELP),
        KeyCode::F(2) | KeyCode::Char('s') => Some(SETUP),
        KeyCode::Char('a') => Some(ABOUT),
        _ => None,
    }
}

impl Page<AppState> for ProcessListScreen {
    fn id(&self) -> ScreenId {
        PROCESSES
    }

    fn control(&mut self) -> &mut dyn Control {
        &mut self.screen
    }

    fn activate(&mut self, cx: &mut PageContext<'_, AppState>) {
        let (ctx, state) = cx.parts();
        if state.refresh_due(Instant::now()) {
            self.refresh(state, ctx);
        } else {
            self.populate(state, ctx);
        }
    }

    fn key_pressed(&mut self, key: &KeyEvent, cx: &mut PageContext<'_, AppState>) -> bool {
        if self.filtering {
            let (ctx, state) = cx.parts();
            self.filter_key(key, state, ctx);
            return true;
        }
        if !self.screen.is_modal() && is_plain(key) {
            if let Some(target) = navigation_target(key) {
                cx.show(target);
                return true;
            }
        }

        let (ctx, state) = cx.parts();
        self.notice = None;
        match self.screen.dispatch_key(key, ctx) {
            KeyOutcome::Confirmed(command) => {
                self.execute(command, state, ctx);
                return true;
            }
            KeyOutcome::Handled => return true,
            KeyOutcome::Unhandled => {}
        }
        if !is_plain(key) {
            return false;
        }
        if matches!(key.code, KeyCode::F(3) | KeyCode::Char('/')) {
            self.begin_filter(state, ctx);
            return true;
        }
        match self.command_for(key, state) {
            Some(command) => {
                self.request(command, state, ctx);
                true
            }
            None => false,
        }
    }

    fn tick(&mut self, cx: &mut PageContext<'_, AppState>) {
        let (ctx, state) = cx.parts();
        if state.refresh_due(Instant::now()) {
            self.refresh(state, ctx);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
