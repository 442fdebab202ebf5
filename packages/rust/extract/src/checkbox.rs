//! Checked rows in forms, reported as conditions.
//!
//! Recognized shapes, all on lowercased text:
//!
//! - pipe-table rows where a label cell is followed by a mark cell (`| asthma | ✓ |`)
//! - table cells or list items that start with a mark (`| ✓ asthma |`, `☑ asthma`)
//! - Markdown task items (`- [x] asthma`)

use std::sync::LazyLock;

use regex::Regex;

use crate::lists::push_unique;

/// Labels must be longer than this many characters.
const MIN_LABEL_LEN: usize = 3;

const MARKS: &[&str] = &["✓", "✔\u{fe0f}", "✔", "☑\u{fe0f}", "☑", "✅", "[x]", "x"];

static TASK_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s*\[x\]\s+(.+)$").expect("valid regex"));

static MARKED_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?(?:✓|✔\x{fe0f}?|☑\x{fe0f}?|✅)\s*(.+)$").expect("valid regex")
});

/// Labels of every checked row, in document order.
pub(crate) fn checked_labels(text: &str) -> Vec<String> {
    let mut labels = Vec::new();

    for line in text.lines() {
        if line.trim_start().starts_with('|') {
            for label in table_row_labels(line) {
                push_label(&mut labels, label);
            }
            continue;
        }

        let item = TASK_ITEM_RE
            .captures(line)
            .or_else(|| MARKED_ITEM_RE.captures(line))
            .and_then(|c| c.get(1));
        if let Some(item) = item {
            push_label(&mut labels, item.as_str());
        }
    }

    labels
}

fn table_row_labels(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let cells: Vec<&str> = inner.split('|').map(str::trim).collect();

    let mut labels = Vec::new();
    for (i, cell) in cells.iter().copied().enumerate() {
        if is_mark(cell) {
            match i.checked_sub(1).map(|p| cells[p]) {
                Some(previous) if !is_mark(previous) => labels.push(previous),
                _ => {}
            }
        } else if let Some(rest) = strip_leading_mark(cell) {
            labels.push(rest);
        }
    }
    labels
}

fn is_mark(cell: &str) -> bool {
    MARKS.contains(&cell)
}

fn strip_leading_mark(cell: &str) -> Option<&str> {
    MARKS
        .iter()
        .filter(|m| **m != "x")
        .find_map(|m| cell.strip_prefix(m))
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
}

fn push_label(labels: &mut Vec<String>, raw: &str) {
    let label = raw.replace(['*', '_'], "");
    let label = label.trim().trim_end_matches('.').trim();
    let is_separator = label.chars().all(|c| matches!(c, '-' | ':' | ' '));

    if label.chars().count() > MIN_LABEL_LEN && !is_separator {
        push_unique(labels, label.to_string());
    }
}
