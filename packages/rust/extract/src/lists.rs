//! Label-driven list fields: conditions, medications, allergies, dietary restrictions.

use std::sync::LazyLock;

use regex::Regex;

use crate::segments::{self, Segment, label_regex};

/// A list-valued profile field filled from labelled prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListField {
    Conditions,
    Medications,
    Allergies,
    DietaryRestrictions,
}

impl ListField {
    /// Fragments must be longer than this many characters.
    fn min_len(self) -> usize {
        match self {
            Self::Allergies => 1,
            _ => 2,
        }
    }

    fn labels(self) -> &'static [Regex] {
        match self {
            Self::Conditions => &CONDITION_LABELS,
            Self::Medications => &MEDICATION_LABELS,
            Self::Allergies => &ALLERGY_LABELS,
            Self::DietaryRestrictions => &DIETARY_LABELS,
        }
    }
}

fn compile(labels: &[&str]) -> Vec<Regex> {
    labels.iter().map(|l| label_regex(l)).collect()
}

static CONDITION_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bdiagnos(?:is|es)\b",
        r"\bconditions?\b",
        r"\bmedical history\b",
        r"\bhistory of\b",
        r"\bproblem list\b",
    ])
});

static MEDICATION_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bmedications?\b",
        r"\bprescriptions?\b",
        r"\bdrugs?[ \t]*:",
        r"\btaking\b",
        r"\bmeds\b",
    ])
});

static ALLERGY_LABELS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[r"\ballerg(?:y|ies)\b", r"\ballergic to\b"]));

static DIETARY_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bdiet(?:ary)? restrictions?\b",
        r"\bfood restrictions?\b",
        r"\bspecial diet\b",
        r"\bdiet[ \t]*:",
    ])
});

/// Whole-word tokens that mark an allergy line as a negative finding.
static NEGATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:none|no|nkda|nka|denies)\b").expect("valid regex"));

static PRESENT_ILLNESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*present illness\b").expect("valid regex"));

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;|]").expect("valid regex"));

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•+]|\d+[.)])\s+").expect("valid regex"));

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Fragments that carry no information in any list.
const PLACEHOLDERS: &[&str] = &["none", "n/a", "na", "nil", "unknown", "not applicable", "yes", "no"];

/// Extract one list field from lowercased text, in first-seen order.
pub(crate) fn extract(field: ListField, text: &str) -> Vec<String> {
    let mut values = Vec::new();

    for label in field.labels() {
        for segment in segments::capture(label, text) {
            if field == ListField::Allergies && is_negated(&segment) {
                continue;
            }
            if field == ListField::Conditions && is_present_illness(&segment) {
                continue;
            }
            for fragment in SPLIT_RE.split(segment.text) {
                if let Some(value) = clean_fragment(fragment, field.min_len()) {
                    push_unique(&mut values, value);
                }
            }
        }
    }

    values
}

fn is_negated(segment: &Segment<'_>) -> bool {
    NEGATION_RE.is_match(segment.line) || NEGATION_RE.is_match(segment.text)
}

/// "History of present illness" is a narrative heading, not a condition label.
fn is_present_illness(segment: &Segment<'_>) -> bool {
    PRESENT_ILLNESS_RE.is_match(segment.text)
}

/// Trim decoration from a fragment and apply the noise filters.
fn clean_fragment(fragment: &str, min_len: usize) -> Option<String> {
    let unemphasized = fragment.replace(['*', '_'], "");
    let trimmed = unemphasized.trim_matches(|c: char| c.is_whitespace() || "|•".contains(c));
    let trimmed = LIST_MARKER_RE.replace(trimmed, "");
    let trimmed = trimmed.trim_matches(|c: char| c.is_whitespace() || "|•.:".contains(c));
    let value = SPACES_RE.replace_all(trimmed, " ").into_owned();

    if value.chars().count() <= min_len || PLACEHOLDERS.contains(&value.as_str()) {
        return None;
    }
    Some(value)
}

/// Append `value` unless an identical entry is already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
