//! Display-width measurement and terminal-safe text.
//!
//! Column arithmetic in the widgets is done in terminal cells, not chars:
//! CJK and most emoji take two cells, combining marks take none.

use std::borrow::Cow;

use ratatui::layout::Alignment;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Number of terminal cells `text` occupies.
pub fn display_width(text: &str) -> usize {
    text.width()
}

/// Number of terminal cells `ch` occupies; control characters count as zero.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Column at which char index `index` of `chars` starts.
pub fn column_of(chars: &[char], index: usize) -> usize {
    chars[..index.min(chars.len())].iter().copied().map(char_width).sum()
}

/// Longest prefix of `text` that fits in `width` cells, and its width.
///
/// A wide character that would straddle the limit is dropped whole.
pub fn clip(text: &str, width: usize) -> (&str, usize) {
    let mut used = 0;
    for (i, ch) in text.char_indices() {
        let w = char_width(ch);
        if used + w > width {
            return (&text[..i], used);
        }
        used += w;
    }
    (text, used)
}

/// Pad or clip `text` to exactly `width` columns.
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let (shown, used) = clip(text, width);
    let slack = width - used;
    let (left, right) = match alignment {
        Alignment::Left => (0, slack),
        Alignment::Right => (slack, 0),
        _ => (slack / 2, slack - slack / 2),
    };
    format!("{}{}{}", " ".repeat(left), shown, " ".repeat(right))
}

/// Replace control characters so `text` cannot drive the terminal.
///
/// Tabs and newlines become a single space; every other C0/C1 control
/// (ESC, BEL, DEL, CSI ...) becomes `?`. Borrowed when nothing changes.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|ch| match ch {
                '\t' | '\n' | '\r' => ' ',
                c if c.is_control() => '?',
                c => c,
            })
            .collect(),
    )
}

// ============================================================================
// TESTS
// ============================================================================
