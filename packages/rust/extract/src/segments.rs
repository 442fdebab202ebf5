//! Label-driven segment capture shared by list fields and goal statements.
//!
//! A label captures the rest of its line. When that remainder is blank the
//! bullet items directly below the label are captured instead, one segment
//! per item.

use std::sync::LazyLock;

use regex::Regex;

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•+]|\d+[.)])\s+(.+)$").expect("valid regex"));

/// Text captured after one label occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    /// The whole line the label sits on.
    pub line: &'a str,
    /// The captured text (line remainder or one bullet item).
    pub text: &'a str,
}

/// Build a label pattern that captures the rest of the line in group 1.
pub(crate) fn label_regex(label: &str) -> Regex {
    Regex::new(&format!(r"{label}[: \t]*([^\n]*)")).expect("valid label pattern")
}

/// Collect every segment captured by `label` in `text`.
pub(crate) fn capture<'a>(label: &Regex, text: &'a str) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();

    for caps in label.captures_iter(text) {
        let (Some(whole), Some(rest)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let line = enclosing_line(text, whole.start(), whole.end());

        if !rest.as_str().trim().is_empty() {
            segments.push(Segment {
                line,
                text: rest.as_str(),
            });
            continue;
        }

        // Remainder of the label line is empty, so read the bullet block below it.
        let below = text[whole.end()..].lines().skip(1).skip_while(|l| l.trim().is_empty());
        for item_line in below {
            let Some(item) = BULLET_RE.captures(item_line).and_then(|c| c.get(1)) else {
                break;
            };
            segments.push(Segment {
                line,
                text: item.as_str(),
            });
        }
    }

    segments
}

fn enclosing_line(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
    &text[line_start..line_end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments.iter().map(|s| s.text).collect()
    }

    #[test]
    fn captures_line_remainder() {
        let re = label_regex(r"\bmedications?\b");
        let segments = capture(&re, "medications: metformin, lisinopril\nnext line");
        assert_eq!(texts(&segments), vec!["metformin, lisinopril"]);
        assert_eq!(segments[0].line, "medications: metformin, lisinopril");
    }

    #[test]
    fn continues_into_bullets() {
        let re = label_regex(r"\bmedications?\b");
        let text = "medications:\n\n- metformin 500mg\n- lisinopril\n\nplan: review";
        let segments = capture(&re, text);
        assert_eq!(texts(&segments), vec!["metformin 500mg", "lisinopril"]);
        assert!(segments.iter().all(|s| s.line == "medications:"));
    }

    #[test]
    fn numbered_items_continue() {
        let re = label_regex(r"\bdiagnos(?:is|es)\b");
        let segments = capture(&re, "diagnoses:\n1. asthma\n2) eczema\nend");
        assert_eq!(texts(&segments), vec!["asthma", "eczema"]);
    }

    #[test]
    fn label_without_bullets_yields_nothing() {
        let re = label_regex(r"\ballerg(?:y|ies)\b");
        assert!(capture(&re, "allergies:\nreviewed today").is_empty());
        assert!(capture(&re, "allergies:").is_empty());
    }

    #[test]
    fn every_occurrence_is_captured() {
        let re = label_regex(r"\bdiagnosis\b");
        let segments = capture(&re, "diagnosis: asthma\n...\ndiagnosis: gout");
        assert_eq!(texts(&segments), vec!["asthma", "gout"]);
    }
}
