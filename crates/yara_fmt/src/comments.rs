//! Trailing-comment column alignment.
//!
//! A dry emission pass records, for each output line, the column reached by
//! the last non-comment token. A second real pass pads any trailing comment
//! on that line out to the recorded column, so comments on adjacent lines
//! line up in a ragged block instead of hugging whatever code precedes them.

use rustc_hash::FxHashMap;

pub type LineWidths = FxHashMap<usize, usize>;

/// Records that code reached `column` on `line`, keeping the maximum.
pub fn record_width(widths: &mut LineWidths, line: usize, column: usize) {
    let entry = widths.entry(line).or_insert(0);
    if column > *entry {
        *entry = column;
    }
}

/// Spaces to emit before a trailing comment so it lands at the aligned
/// column recorded for `line`, falling back to a single separating space
/// when no alignment target was recorded (the comment opens its own line).
#[must_use]
pub fn padding(widths: &LineWidths, line: usize, current_column: usize) -> String {
    match widths.get(&line) {
        Some(&target) if target + 1 > current_column => " ".repeat(target + 1 - current_column),
        _ => " ".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_up_to_the_recorded_column() {
        let mut widths = LineWidths::default();
        record_width(&mut widths, 0, 20);
        assert_eq!(padding(&widths, 0, 10).len(), 11);
    }

    #[test]
    fn falls_back_to_one_space_with_no_recorded_width() {
        let widths = LineWidths::default();
        assert_eq!(padding(&widths, 0, 10), " ");
    }

    #[test]
    fn record_width_keeps_the_maximum() {
        let mut widths = LineWidths::default();
        record_width(&mut widths, 2, 5);
        record_width(&mut widths, 2, 12);
        record_width(&mut widths, 2, 3);
        assert_eq!(widths[&2], 12);
    }
}
