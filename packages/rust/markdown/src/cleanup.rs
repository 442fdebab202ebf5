//! Post-conversion cleanup pipeline for parser Markdown.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on Markdown text.
pub(crate) fn run_pipeline(md: &str, include_marginalia: bool) -> String {
    let mut result = md.replace("\r\n", "\n");

    result = handle_marginalia(&result, include_marginalia);
    result = strip_leftover_html(&result);
    result = decode_entities(&result);
    result = unify_check_marks(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);
    result = trim_document(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Marginalia comments
// ---------------------------------------------------------------------------

/// Drop `<!-- ... -->` comments, or keep their text on its own line.
fn handle_marginalia(md: &str, include: bool) -> String {
    static COMMENT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("valid regex"));

    if include {
        COMMENT_RE
            .replace_all(md, |caps: &regex::Captures| format!("\n{}\n", caps[1].trim()))
            .to_string()
    } else {
        COMMENT_RE.replace_all(md, "").to_string()
    }
}

// ---------------------------------------------------------------------------
// Pass 2: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove stray HTML tags outside code blocks, preserving inner text.
///
/// `<br>` becomes a line break so that form fields stay on separate lines.
fn strip_leftover_html(md: &str) -> String {
    static BR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*(?:\s[^<>]*)?/?>").expect("valid regex"));

    let mut lines: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
            continue;
        }

        if in_code_block {
            lines.push(line.to_string());
            continue;
        }

        let line = BR_RE.replace_all(line, "\n");
        lines.push(TAG_RE.replace_all(&line, "").to_string());
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Decode common HTML entities
// ---------------------------------------------------------------------------

/// Decode the handful of entities parsers leave behind in Markdown.
fn decode_entities(md: &str) -> String {
    const ENTITIES: [(&str, &str); 8] = [
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#10003;", "✓"),
        ("&check;", "✓"),
        // Must stay last so `&amp;lt;` decodes to `&lt;`, not `<`.
        ("&amp;", "&"),
    ];

    ENTITIES
        .iter()
        .fold(md.to_string(), |acc, (entity, text)| acc.replace(entity, text))
}

// ---------------------------------------------------------------------------
// Pass 4: Unify checkbox glyphs
// ---------------------------------------------------------------------------

/// Rewrite the filled-checkbox variants parsers emit as a single `✓`.
fn unify_check_marks(md: &str) -> String {
    static MARK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"✔\x{fe0f}?|☑\x{fe0f}?|✅|\[[xX]\]").expect("valid regex")
    });

    MARK_RE.replace_all(md, "✓").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 5: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 6: Clean up excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ blank lines into exactly 2.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 7: Trim document edges
// ---------------------------------------------------------------------------

/// Drop leading blank lines and end the text with exactly one newline.
fn trim_document(md: &str) -> String {
    let trimmed = md.trim_start_matches('\n').trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marginalia_dropped_by_default() {
        let input = "<!-- Page 1 of 3 -->\nAge: 40";
        assert_eq!(handle_marginalia(input, false), "\nAge: 40");
    }

    #[test]
    fn marginalia_kept_when_requested() {
        let input = "Weight: 80 kg<!-- Clinic letterhead -->";
        let result = handle_marginalia(input, true);
        assert_eq!(result, "Weight: 80 kg\nClinic letterhead\n");
    }

    #[test]
    fn strip_leftover_html_removes_anchors() {
        let input = "<a id='0f3c'></a>\nDiagnosis: <b>Asthma</b>";
        let result = strip_leftover_html(input);
        assert_eq!(result, "\nDiagnosis: Asthma");
    }

    #[test]
    fn strip_leftover_html_splits_on_br() {
        let input = "Age: 40<br/>Sex: F";
        assert_eq!(strip_leftover_html(input), "Age: 40\nSex: F");
    }

    #[test]
    fn strip_leftover_html_keeps_comparisons() {
        let input = "Target BP <130/80 and A1c < 7";
        assert_eq!(strip_leftover_html(input), input);
    }

    #[test]
    fn strip_leftover_html_preserves_code_blocks() {
        let input = "```html\n<div>Preserved</div>\n```\n<span>Text</span>";
        let result = strip_leftover_html(input);
        assert!(result.contains("<div>Preserved</div>"));
        assert!(result.ends_with("\nText"));
    }

    #[test]
    fn decode_entities_handles_marks() {
        assert_eq!(decode_entities("Asthma &#10003; &amp; eczema"), "Asthma ✓ & eczema");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn check_mark_variants_unified() {
        let input = "| Asthma | ✔️ |\n| Gout | [X] |\n- [x] Eczema\n☑ Migraine\n- [ ] Anemia";
        assert_eq!(
            unify_check_marks(input),
            "| Asthma | ✓ |\n| Gout | ✓ |\n- ✓ Eczema\n✓ Migraine\n- [ ] Anemia"
        );
    }

    #[test]
    fn clean_blank_lines_collapses_excess() {
        let input = "Line 1\n\n\n\n\nLine 2";
        assert_eq!(clean_blank_lines(input), "Line 1\n\n\nLine 2");
    }

    #[test]
    fn trim_document_normalizes_edges() {
        assert_eq!(trim_document("\n\nContent\n\n\n"), "Content\n");
        assert_eq!(trim_document("Content"), "Content\n");
    }

    #[test]
    fn full_pipeline_cleans_parser_output() {
        let input = "<!-- header -->\r\n# Labs   \r\n\r\n\r\n\r\n\r\nCholesterol: 210&nbsp;mg/dL<br>";
        let result = run_pipeline(input, false);
        assert_eq!(result, "# Labs\n\n\nCholesterol: 210 mg/dL\n");
    }
}
