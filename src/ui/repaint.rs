//! Repaint planning for single-line editors.
//!
//! Editing happens in place on the terminal: nothing is double-buffered, so
//! after a buffer edit the affected columns must be rewritten by hand. The
//! planner compares the text and cursor before and after an edit and returns
//! the minimal cursor moves and writes that turn the old line into the new
//! one. Shrinking edits write one blank per freed column to erase the stale
//! tail, then walk the cursor back to its logical position.
//!
//! Cursors are char indices into the text; the plan itself is in terminal
//! columns, so wide characters move the cursor two cells.
//!
//! Pure function, no I/O. `InputBox` replays the plan against the console.

use super::text::{char_width, column_of, display_width};

/// One terminal operation, relative to the current cursor column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintOp {
    /// Move the cursor left by n columns.
    Left(usize),
    /// Move the cursor right by n columns.
    Right(usize),
    /// Write text at the cursor; the cursor advances past it.
    Write(String),
}

fn width_of(chars: &[char]) -> usize {
    chars.iter().copied().map(char_width).sum()
}

/// Plan the operations that turn (`old`, `old_cursor`) into (`new`, `new_cursor`).
///
/// The terminal cursor is assumed to sit at `old_cursor` when the plan starts
/// and ends at `new_cursor`.
pub fn plan_repaint(old: &str, old_cursor: usize, new: &str, new_cursor: usize) -> Vec<PaintOp> {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let from = column_of(&old, old_cursor);
    let to = column_of(&new, new_cursor);

    if old == new {
        return moves(from, to);
    }

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let start = prefix.min(old_cursor).min(new_cursor);
    let start_column = column_of(&new, start);

    let mut ops = moves(from, start_column);

    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_middle = &old[prefix..old.len() - suffix];
    let new_middle = &new[prefix..new.len() - suffix];

    let written: String = if width_of(old_middle) == width_of(new_middle) {
        // Same width: the tail stays put, only the changed middle is rewritten.
        new[start..new.len() - suffix].iter().collect()
    } else {
        let erase = width_of(&old).saturating_sub(width_of(&new));
        new[start..]
            .iter()
            .copied()
            .chain(std::iter::repeat_n(' ', erase))
            .collect()
    };

    let position = start_column + display_width(&written);
    if !written.is_empty() {
        ops.push(PaintOp::Write(written));
    }
    ops.extend(moves(position, to));
    ops
}

fn moves(from: usize, to: usize) -> Vec<PaintOp> {
    if to < from {
        vec![PaintOp::Left(from - to)]
    } else if to > from {
        vec![PaintOp::Right(to - from)]
    } else {
        Vec::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use PaintOp::{Left, Right, Write};

    fn w(s: &str) -> PaintOp {
        Write(s.to_string())
    }

    #[test]
    fn test_append_writes_single_char() {
        assert_eq!(plan_repaint("ab", 2, "abc", 3), vec![w("c")]);
    }

    #[test]
    fn test_insert_rewrites_tail_and_restores_cursor() {
        // "a|c" + 'b' in insert mode -> "ab|c"
        assert_eq!(plan_repaint("ac", 1, "abc", 2), vec![w("bc"), Left(1)]);
    }

    #[test]
    fn test_overwrite_writes_only_the_replaced_char() {
        assert_eq!(plan_repaint("abc", 1, "aXc", 2), vec![w("X")]);
    }

    #[test]
    fn test_backspace_rewinds_and_blanks_ghost_char() {
        // "ab|c" backspace -> "a|c"
        assert_eq!(
            plan_repaint("abc", 2, "ac", 1),
            vec![Left(1), w("c "), Left(2)]
        );
    }

    #[test]
    fn test_backspace_at_end_blanks_last_column() {
        assert_eq!(plan_repaint("abc", 3, "ab", 2), vec![Left(1), w(" "), Left(1)]);
    }

    #[test]
    fn test_delete_rewrites_tail_without_moving_first() {
        // "a|bc" delete -> "a|c"
        assert_eq!(plan_repaint("abc", 1, "ac", 1), vec![w("c "), Left(2)]);
    }

    #[test]
    fn test_cursor_moves_only() {
        assert_eq!(plan_repaint("abc", 2, "abc", 1), vec![Left(1)]);
        assert_eq!(plan_repaint("abc", 1, "abc", 2), vec![Right(1)]);
        assert!(plan_repaint("abc", 1, "abc", 1).is_empty());
    }

    #[test]
    fn test_clear_erases_whole_line() {
        assert_eq!(
            plan_repaint("abc", 3, "", 0),
            vec![Left(3), w("   "), Left(3)]
        );
    }

    #[test]
    fn test_wide_char_append_advances_two_columns() {
        assert_eq!(plan_repaint("", 0, "日", 1), vec![w("日")]);
        assert_eq!(plan_repaint("日本", 2, "日本", 1), vec![Left(2)]);
    }

    #[test]
    fn test_backspace_over_wide_char_blanks_both_cells() {
        assert_eq!(
            plan_repaint("a日", 2, "a", 1),
            vec![Left(2), w("  "), Left(2)]
        );
    }

    #[test]
    fn test_overwrite_with_same_char_just_advances() {
        assert_eq!(plan_repaint("abc", 1, "abc", 2), vec![Right(1)]);
    }
}
