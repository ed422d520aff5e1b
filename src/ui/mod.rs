//! Retained-mode console widget framework.
//!
//! Module structure:
//! - `text_buffer`: single-line edit buffer (pure)
//! - `text`: display width and control-character sanitising (pure)
//! - `repaint`: minimal repaint planning for edited text (pure)
//! - `control`: the `Control` trait, `ControlBase`, docking, `RenderContext`
//! - `collection`: the `Widget` variants and `ControlCollection`
//! - `label`, `input_box`, `message_box`, `list_view`: widgets
//! - `screen`: full-terminal page with a modal message box slot
//! - `application`: screen stack and main loop
//! - `theme`: colours

pub mod application;
pub mod collection;
pub mod control;
pub mod input_box;
pub mod label;
pub mod list_view;
pub mod message_box;
pub mod repaint;
pub mod screen;
pub mod text;
pub mod text_buffer;
pub mod theme;

pub use application::{Page, PageContext, ScreenApplication, ScreenApplicationContext, ScreenId};
pub use collection::{ControlCollection, Widget};
pub use control::{Control, ControlBase, Dock, RenderContext};
pub use input_box::{InputBox, InputResult};
pub use label::{Label, Panel};
pub use list_view::{
    CellStyle, ListView, ListViewColumnHeader, ListViewColumnHeaderCollection, ListViewItem,
    ListViewItemCollection, ListViewSubItem, ListViewSubItemCollection,
};
pub use message_box::{Buttons, MessageBox, MessageResult};
pub use screen::{KeyOutcome, Screen};
pub use text_buffer::TextBuffer;
