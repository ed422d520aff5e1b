//! Console colour scheme.
//!
//! Centralized colour definitions so screens and widgets agree on meaning.
//! Pure data, consumed by the drawing code.
//!
//! Color semantics:
//! - Blue background: normal screen surface
//! - Cyan bar: title and column headers
//! - Grey box on black shadow: modal dialogs
//! - Yellow: hotkeys and interactive hints
//! - Red: heavy CPU load or zombie processes
//! - Green: running processes

use crossterm::style::Color;

// ============================================================================
// SURFACES
// ============================================================================

/// Default text on the screen surface.
pub const TEXT_FG: Color = Color::Grey;
pub const TEXT_BG: Color = Color::DarkBlue;

/// Title bar and list column headers.
pub const HEADER_FG: Color = Color::Black;
pub const HEADER_BG: Color = Color::DarkCyan;

/// Bottom line with key hints.
pub const STATUS_FG: Color = Color::Black;
pub const STATUS_BG: Color = Color::DarkCyan;

/// Hotkey letters inside the status line and dialog buttons.
pub const HOTKEY_FG: Color = Color::Yellow;

// ============================================================================
// LISTS
// ============================================================================

/// Highlighted row in a list view.
pub const SELECTED_FG: Color = Color::Black;
pub const SELECTED_BG: Color = Color::Cyan;

/// Row styles keyed on process state and load.
pub const RUNNING_FG: Color = Color::Green;
pub const HOT_FG: Color = Color::Red;
pub const ZOMBIE_FG: Color = Color::DarkRed;
pub const DIM_FG: Color = Color::DarkGrey;

// ============================================================================
// DIALOGS
// ============================================================================

pub const DIALOG_FG: Color = Color::Black;
pub const DIALOG_BG: Color = Color::Grey;
pub const DIALOG_TITLE_FG: Color = Color::White;
pub const DIALOG_TITLE_BG: Color = Color::DarkBlue;
pub const SHADOW_BG: Color = Color::Black;

/// Button with focus.
pub const BUTTON_FOCUS_FG: Color = Color::White;
pub const BUTTON_FOCUS_BG: Color = Color::DarkGreen;

/// Editable field inside an input box.
pub const INPUT_FG: Color = Color::White;
pub const INPUT_BG: Color = Color::DarkGrey;

// ============================================================================
// TESTS
// ============================================================================
