//! Tabular control: column headers over rows of sub-items.
//!
//! Items are not required to carry one sub-item per column. Missing cells
//! render blank and surplus sub-items are ignored.

use std::ops::{Index, IndexMut};

use crossterm::event::{KeyCode, KeyEvent};
use crossterm::style::Color;
use ratatui::layout::{Alignment, Rect};

use crate::console::set_colours;

use super::control::{Control, ControlBase, Dock, RenderContext};
use super::text::{align_text, sanitize};
use super::theme;

/// Foreground and background for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub foreground: Color,
    pub background: Color,
}

// ============================================================================
// COLUMN HEADERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewColumnHeader {
    pub text: String,
    /// Width in columns. Zero takes whatever is left of the row.
    pub width: u16,
    pub alignment: Alignment,
    pub foreground: Color,
    pub background: Color,
}

impl ListViewColumnHeader {
    pub fn new(text: impl Into<String>, width: u16) -> Self {
        ListViewColumnHeader {
            text: text.into(),
            width,
            alignment: Alignment::Left,
            foreground: theme::HEADER_FG,
            background: theme::HEADER_BG,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_colours(mut self, foreground: Color, background: Color) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListViewColumnHeaderCollection {
    headers: Vec<ListViewColumnHeader>,
}

impl ListViewColumnHeaderCollection {
    pub fn add(&mut self, header: ListViewColumnHeader) -> usize {
        self.headers.push(header);
        self.headers.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ListViewColumnHeader> {
        self.headers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ListViewColumnHeader> {
        self.headers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn clear(&mut self) {
        self.headers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListViewColumnHeader> {
        self.headers.iter()
    }

    /// (offset, width) of every column laid out across `width` cells, with a
    /// one-cell gap between columns. Columns that do not fit get width 0.
    fn layout(&self, width: u16) -> Vec<(u16, u16)> {
        let mut spans = Vec::with_capacity(self.headers.len());
        let mut offset = 0u16;
        for header in &self.headers {
            let room = width.saturating_sub(offset);
            let w = if header.width == 0 {
                room
            } else {
                header.width.min(room)
            };
            spans.push((offset, w));
            offset = offset.saturating_add(w).saturating_add(1);
        }
        spans
    }
}

impl Index<usize> for ListViewColumnHeaderCollection {
    type Output = ListViewColumnHeader;

    fn index(&self, index: usize) -> &Self::Output {
        &self.headers[index]
    }
}

impl IndexMut<usize> for ListViewColumnHeaderCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.headers[index]
    }
}

// ============================================================================
// ITEMS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewSubItem {
    pub text: String,
    pub style: Option<CellStyle>,
}

fn clean(text: String) -> String {
    if text.chars().any(char::is_control) {
        sanitize(&text).into_owned()
    } else {
        text
    }
}

impl ListViewSubItem {
    /// Cell text; control characters are replaced so the text cannot
    /// drive the terminal.
    pub fn new(text: impl Into<String>) -> Self {
        ListViewSubItem {
            text: clean(text.into()),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, foreground: Color, background: Color) -> Self {
        ListViewSubItem {
            text: clean(text.into()),
            style: Some(CellStyle {
                foreground,
                background,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListViewSubItemCollection {
    cells: Vec<ListViewSubItem>,
}

impl ListViewSubItemCollection {
    pub fn add(&mut self, sub_item: ListViewSubItem) -> usize {
        self.cells.push(sub_item);
        self.cells.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ListViewSubItem> {
        self.cells.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ListViewSubItem> {
        self.cells.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListViewSubItem> {
        self.cells.iter()
    }
}

impl Index<usize> for ListViewSubItemCollection {
    type Output = ListViewSubItem;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

impl IndexMut<usize> for ListViewSubItemCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.cells[index]
    }
}

/// One row. `tag` carries a caller-defined key such as a pid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListViewItem {
    pub sub_items: ListViewSubItemCollection,
    pub tag: u64,
}

impl ListViewItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row of plain cells.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut item = ListViewItem::new();
        for text in texts {
            item.sub_items.add(ListViewSubItem::new(text));
        }
        item
    }

    pub fn with_tag(mut self, tag: u64) -> Self {
        self.tag = tag;
        self
    }

    pub fn push(mut self, sub_item: ListViewSubItem) -> Self {
        self.sub_items.add(sub_item);
        self
    }

    /// Text of column `index`, blank when the row is short.
    pub fn text(&self, index: usize) -> &str {
        self.sub_items.get(index).map_or("", |s| s.text.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListViewItemCollection {
    rows: Vec<ListViewItem>,
}

impl ListViewItemCollection {
    pub fn add(&mut self, item: ListViewItem) -> usize {
        self.rows.push(item);
        self.rows.len() - 1
    }

    pub fn remove_at(&mut self, index: usize) -> Option<ListViewItem> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&ListViewItem> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ListViewItem> {
        self.rows.get_mut(index)
    }

    pub fn position_by_tag(&self, tag: u64) -> Option<usize> {
        self.rows.iter().position(|r| r.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListViewItem> {
        self.rows.iter()
    }
}

impl Index<usize> for ListViewItemCollection {
    type Output = ListViewItem;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl IndexMut<usize> for ListViewItemCollection {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.rows[index]
    }
}

impl FromIterator<ListViewItem> for ListViewItemCollection {
    fn from_iter<T: IntoIterator<Item = ListViewItem>>(iter: T) -> Self {
        ListViewItemCollection {
            rows: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// LIST VIEW
// ============================================================================

#[derive(Debug)]
pub struct ListView {
    base: ControlBase,
    columns: ListViewColumnHeaderCollection,
    items: ListViewItemCollection,
    selected: Option<usize>,
    scroll: usize,
    show_headers: bool,
}

impl ListView {
    pub fn new(name: impl Into<String>) -> Self {
        ListView {
            base: ControlBase::new(name),
            columns: ListViewColumnHeaderCollection::default(),
            items: ListViewItemCollection::default(),
            selected: None,
            scroll: 0,
            show_headers: true,
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

    pub fn with_column(mut self, header: ListViewColumnHeader) -> Self {
        self.columns.add(header);
        self
    }

    pub fn with_headers(mut self, show: bool) -> Self {
        self.show_headers = show;
        self
    }

    pub fn columns(&self) -> &ListViewColumnHeaderCollection {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ListViewColumnHeaderCollection {
        &mut self.columns
    }

    pub fn items(&self) -> &ListViewItemCollection {
        &self.items
    }

    /// Direct access to the rows. The selection is re-clamped on the next
    /// draw or key.
    pub fn items_mut(&mut self) -> &mut ListViewItemCollection {
        &mut self.items
    }

    /// Replace all rows, keeping the selection on the same tag when it
    /// survives, else on the same index clamped to the new length.
    pub fn set_items(&mut self, items: ListViewItemCollection) {
        let tag = self.selected_item().map(|item| item.tag);
        self.items = items;
        if let Some(index) = tag.and_then(|t| self.items.position_by_tag(t)) {
            self.selected = Some(index);
        }
        self.clamp_selection();
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_selected(&mut self, index: Option<usize>) {
        self.selected = index;
        self.clamp_selection();
    }

    pub fn selected_item(&self) -> Option<&ListViewItem> {
        self.items.get(self.selected?)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn header_rows(&self) -> u16 {
        u16::from(self.show_headers)
    }

    /// Rows available for items.
    pub fn page_rows(&self) -> usize {
        usize::from(self.base.bounds().height.saturating_sub(self.header_rows()))
    }

    fn clamp_selection(&mut self) {
        let len = self.items.len();
        self.selected = match self.selected {
            _ if len == 0 => None,
            None => Some(0),
            Some(i) => Some(i.min(len - 1)),
        };
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        let page = self.page_rows().max(1);
        let max_scroll = self.items.len().saturating_sub(page);
        if let Some(selected) = self.selected {
            if selected < self.scroll {
                self.scroll = selected;
            } else if selected >= self.scroll + page {
                self.scroll = selected + 1 - page;
            }
        }
        self.scroll = self.scroll.min(max_scroll);
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(current) = self.selected else {
            return;
        };
        let last = self.items.len().saturating_sub(1);
        self.selected = Some(current.saturating_add_signed(delta).min(last));
        self.scroll_to_selection();
    }

    fn draw_headers(&self, ctx: &mut RenderContext<'_>, spans: &[(u16, u16)]) {
        let console = ctx.console();
        set_colours(console, theme::HEADER_FG, theme::HEADER_BG);
        let width = usize::from(self.base.bounds().width);
        self.base.write_at(console, 0, 0, &" ".repeat(width));
        for (header, &(offset, w)) in self.columns.iter().zip(spans) {
            if w == 0 {
                continue;
            }
            set_colours(console, header.foreground, header.background);
            let text = align_text(&header.text, usize::from(w), header.alignment);
            self.base.write_at(console, offset, 0, &text);
        }
    }

    fn draw_row(&self, ctx: &mut RenderContext<'_>, dy: u16, index: usize, spans: &[(u16, u16)]) {
        let console = ctx.console();
        let width = usize::from(self.base.bounds().width);
        let selected = self.selected == Some(index);
        let (row_fg, row_bg) = if selected {
            (theme::SELECTED_FG, theme::SELECTED_BG)
        } else {
            (self.base.foreground, self.base.background)
        };

        set_colours(console, row_fg, row_bg);
        self.base.write_at(console, 0, dy, &" ".repeat(width));

        let Some(item) = self.items.get(index) else {
            return;
        };
        for (col, (header, &(offset, w))) in self.columns.iter().zip(spans).enumerate() {
            if w == 0 {
                continue;
            }
            let cell = item.sub_items.get(col);
            match cell.and_then(|c| c.style) {
                Some(style) if !selected => set_colours(console, style.foreground, style.background),
                _ => set_colours(console, row_fg, row_bg),
            }
            let text = align_text(item.text(col), usize::from(w), header.alignment);
            self.base.write_at(console, offset, dy, &text);
        }
    }
}

impl Control for ListView {
    fn base(&self) -> &ControlBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControlBase {
        &mut self.base
    }

    fn min_size(&self) -> (u16, u16) {
        (1, self.header_rows() + 1)
    }

    fn on_resize(&mut self) {
        self.scroll_to_selection();
    }

    fn on_draw(&mut self, ctx: &mut RenderContext<'_>) {
        self.clamp_selection();
        let bounds = self.base.bounds();
        let spans = self.columns.layout(bounds.width);

        if self.show_headers {
            self.draw_headers(ctx, &spans);
        }
        for dy in 0..self.page_rows() {
            let row = self.header_rows() + dy as u16;
            self.draw_row(ctx, row, self.scroll + dy, &spans);
        }
    }

    fn on_key(&mut self, key: &KeyEvent, ctx: &mut RenderContext<'_>) -> bool {
        self.clamp_selection();
        let page = self.page_rows().max(1) as isize;
        match key.code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-page),
            KeyCode::PageDown => self.move_selection(page),
            KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::End => self.move_selection(isize::MAX),
            _ => return false,
        }
        self.draw(ctx);
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use crossterm::event::KeyModifiers;

    fn list_with_rows(rows: usize, height: u16) -> ListView {
        let mut list = ListView::new("procs")
            .with_bounds(Rect::new(0, 0, 20, height))
            .with_column(ListViewColumnHeader::new("PID", 5).with_alignment(Alignment::Right))
            .with_column(ListViewColumnHeader::new("NAME", 0));
        list.set_items(
            (0..rows)
                .map(|i| ListViewItem::from_texts([i.to_string(), format!("proc{i}")]).with_tag(i as u64))
                .collect(),
        );
        list.load();
        list
    }

    fn press(list: &mut ListView, console: &mut MemoryConsole, code: KeyCode) -> bool {
        let mut ctx = RenderContext::new(console);
        list.key_pressed(&KeyEvent::new(code, KeyModifiers::NONE), &mut ctx)
    }

    #[test]
    fn test_collections_index_backing_storage() {
        let list = list_with_rows(3, 5);
        assert_eq!(list.columns()[1].text, "NAME");
        assert_eq!(list.items()[2].sub_items[1].text, "proc2");
        assert!(list.columns().get(9).is_none());
    }

    #[test]
    fn test_short_rows_render_blank_cells() {
        let mut console = MemoryConsole::new(20, 3);
        let mut list = ListView::new("l")
            .with_bounds(Rect::new(0, 0, 20, 3))
            .with_column(ListViewColumnHeader::new("A", 4))
            .with_column(ListViewColumnHeader::new("B", 4));
        list.items_mut().add(ListViewItem::from_texts(["x"]));
        list.items_mut().add(ListViewItem::from_texts(["1", "2", "3", "4"]));
        list.load();
        list.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.row_text(0).trim_end(), "A    B");
        assert_eq!(console.row_text(1).trim_end(), "x");
        assert_eq!(console.row_text(2).trim_end(), "1    2");
    }

    #[test]
    fn test_wide_text_is_clipped_to_its_cell() {
        let mut console = MemoryConsole::new(20, 2);
        let mut list = ListView::new("l")
            .with_bounds(Rect::new(0, 0, 20, 2))
            .with_column(ListViewColumnHeader::new("A", 3))
            .with_column(ListViewColumnHeader::new("B", 4));
        list.items_mut().add(ListViewItem::from_texts(["日本語", "x"]));
        list.load();
        list.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.cell(0, 1).ch, '日');
        assert_eq!(console.cell(4, 1).ch, 'x');
        assert_eq!(console.row_text(1).trim_end(), "日  x");
    }

    #[test]
    fn test_control_characters_never_reach_the_console() {
        let item = ListViewItem::new()
            .push(ListViewSubItem::new("a\u{1b}[2Jb"))
            .push(ListViewSubItem::styled("\u{7}bell", Color::Red, Color::Black));
        assert_eq!(item.text(0), "a?[2Jb");
        assert_eq!(item.text(1), "?bell");
    }

    #[test]
    fn test_headers_respect_alignment() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(2, 4);
        list.draw(&mut RenderContext::new(&mut console));
        assert!(console.row_text(0).starts_with("  PID NAME"));
        assert!(console.row_text(1).starts_with("    0 proc0"));
    }

    #[test]
    fn test_first_row_selected_after_fill() {
        let list = list_with_rows(3, 5);
        assert_eq!(list.selected_index(), Some(0));
        assert_eq!(ListView::new("empty").selected_index(), None);
    }

    #[test]
    fn test_down_past_page_scrolls() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(10, 4);
        for _ in 0..4 {
            assert!(press(&mut list, &mut console, KeyCode::Down));
        }
        assert_eq!(list.selected_index(), Some(4));
        assert_eq!(list.scroll_offset(), 2);
        assert!(console.row_text(3).contains("proc4"));
    }

    #[test]
    fn test_home_and_end_jump() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(10, 4);
        press(&mut list, &mut console, KeyCode::End);
        assert_eq!(list.selected_index(), Some(9));
        assert_eq!(list.scroll_offset(), 7);
        press(&mut list, &mut console, KeyCode::Home);
        assert_eq!(list.selected_index(), Some(0));
        assert_eq!(list.scroll_offset(), 0);
    }

    #[test]
    fn test_page_keys_move_by_visible_rows() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(10, 4);
        press(&mut list, &mut console, KeyCode::PageDown);
        assert_eq!(list.selected_index(), Some(3));
        press(&mut list, &mut console, KeyCode::PageUp);
        assert_eq!(list.selected_index(), Some(0));
    }

    #[test]
    fn test_selection_follows_tag_across_refresh() {
        let mut list = list_with_rows(5, 10);
        list.set_selected(Some(3));
        let shuffled = [4u64, 3, 2]
            .into_iter()
            .map(|t| ListViewItem::from_texts([t.to_string()]).with_tag(t))
            .collect();
        list.set_items(shuffled);
        assert_eq!(list.selected_index(), Some(1));
    }

    #[test]
    fn test_selection_clamps_when_rows_shrink() {
        let mut list = list_with_rows(5, 10);
        list.set_selected(Some(4));
        list.set_items([ListViewItem::from_texts(["a"]).with_tag(99)].into_iter().collect());
        assert_eq!(list.selected_index(), Some(0));
        list.set_items(ListViewItemCollection::default());
        assert_eq!(list.selected_index(), None);
        assert!(list.selected_item().is_none());
    }

    #[test]
    fn test_selected_row_uses_selection_colours() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(3, 4);
        list.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.cell(10, 1).background, theme::SELECTED_BG);
        assert_eq!(console.cell(10, 2).background, theme::TEXT_BG);
    }

    #[test]
    fn test_styled_cell_keeps_its_colours_unless_selected() {
        let mut console = MemoryConsole::new(20, 3);
        let mut list = ListView::new("l")
            .with_bounds(Rect::new(0, 0, 20, 3))
            .with_column(ListViewColumnHeader::new("S", 3));
        list.items_mut().add(ListViewItem::from_texts(["R"]));
        list.items_mut().add(
            ListViewItem::new().push(ListViewSubItem::styled("Z", theme::ZOMBIE_FG, theme::TEXT_BG)),
        );
        list.load();
        list.draw(&mut RenderContext::new(&mut console));
        assert_eq!(console.cell(0, 2).foreground, theme::ZOMBIE_FG);
        assert_eq!(console.cell(0, 1).foreground, theme::SELECTED_FG);
    }

    #[test]
    fn test_other_keys_are_not_consumed() {
        let mut console = MemoryConsole::new(20, 4);
        let mut list = list_with_rows(3, 4);
        assert!(!press(&mut list, &mut console, KeyCode::Char('x')));
    }
}
