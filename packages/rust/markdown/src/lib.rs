//! Document text normalization ahead of field extraction.
//!
//! The document-parsing collaborator returns Markdown that frequently embeds
//! raw HTML: `<table>` blocks for forms and lab panels, `<a id>` anchors, and
//! `<!-- ... -->` marginalia. Some sources arrive as whole HTML pages. This
//! crate turns all of that into plain Markdown so the extractor only ever sees
//! pipe tables and prose.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

use healthdigest_shared::{HealthDigestError, Result};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for document normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Keep the inner text of `<!-- ... -->` marginalia instead of dropping it.
    pub include_marginalia: bool,
}

/// Result of normalizing one document.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    /// Clean Markdown text.
    pub text: String,
    /// Number of HTML tables flattened into pipe tables.
    pub tables: usize,
    /// Whether the input was a full HTML document converted via `htmd`.
    pub converted_html: bool,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize parser output into clean Markdown.
///
/// 1. Full HTML documents are converted to Markdown with `htmd`
/// 2. Embedded `<table>` blocks become pipe tables
/// 3. The cleanup pipeline handles marginalia, stray tags, entities and whitespace
#[instrument(skip_all, fields(len = raw.len()))]
pub fn normalize(raw: &str, opts: &NormalizeOptions) -> Result<NormalizedText> {
    let converted_html = looks_like_html_document(raw);

    let (markdown, tables) = if converted_html {
        let (prepared, tables) = flatten_tables(raw);
        let converter = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg", "head"])
            .build();
        let markdown = converter.convert(&prepared).map_err(|e| {
            HealthDigestError::Conversion(format!("htmd conversion failed: {e}"))
        })?;
        (markdown, tables)
    } else {
        flatten_tables(raw)
    };

    let text = cleanup::run_pipeline(&markdown, opts.include_marginalia);

    debug!(
        tables,
        converted_html,
        final_len = text.len(),
        "normalization complete"
    );

    Ok(NormalizedText {
        text,
        tables,
        converted_html,
    })
}

/// A document is treated as HTML when it opens with a doctype, `<html>` or `<body>`.
fn looks_like_html_document(raw: &str) -> bool {
    static HTML_DOC_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^\s*(?:<!doctype\s+html|<html[\s>]|<body[\s>])").expect("valid regex")
    });

    HTML_DOC_RE.is_match(raw)
}

// ---------------------------------------------------------------------------
// Table flattening
// ---------------------------------------------------------------------------

/// Replace every `<table>...</table>` block with an equivalent pipe table.
///
/// Returns the rewritten text and the number of tables converted.
fn flatten_tables(text: &str) -> (String, usize) {
    static TABLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)<table\b.*?</table\s*>").expect("valid regex"));

    let mut count = 0;
    let result = TABLE_RE.replace_all(text, |caps: &regex::Captures| {
        count += 1;
        let fragment = Html::parse_fragment(&caps[0]);
        let table_sel = Selector::parse("table").expect("valid selector");
        match fragment.select(&table_sel).next() {
            Some(table) => html_table_to_markdown(&table),
            None => String::new(),
        }
    });

    (result.into_owned(), count)
}

/// Convert a single HTML table element to a Markdown pipe table.
///
/// A checked `<input type="checkbox">` inside a cell renders as `✓`.
fn html_table_to_markdown(table: &ElementRef) -> String {
    let tr_sel = Selector::parse("tr").expect("valid selector");
    let th_sel = Selector::parse("th").expect("valid selector");
    let td_sel = Selector::parse("td").expect("valid selector");

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut has_header = false;

    for tr in table.select(&tr_sel) {
        let ths: Vec<String> = tr.select(&th_sel).map(|cell| cell_text(&cell)).collect();

        if !ths.is_empty() {
            has_header = true;
            rows.push(ths);
            continue;
        }

        let tds: Vec<String> = tr.select(&td_sel).map(|cell| cell_text(&cell)).collect();

        if !tds.is_empty() {
            rows.push(tds);
        }
    }

    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    for row in &mut rows {
        row.resize(col_count, String::new());
    }

    let mut md = String::from("\n\n");
    let separator = vec!["---"; col_count].join(" | ");

    let data_start = if has_header {
        push_row(&mut md, &rows[0]);
        md.push_str(&format!("| {separator} |\n"));
        1
    } else {
        0
    };

    for row in &rows[data_start..] {
        push_row(&mut md, row);
    }

    md.push('\n');
    md
}

fn push_row(md: &mut String, cells: &[String]) {
    md.push_str("| ");
    md.push_str(&cells.join(" | "));
    md.push_str(" |\n");
}

/// Collapse a cell's text to one line, marking checked checkboxes.
fn cell_text(cell: &ElementRef) -> String {
    let checked_sel =
        Selector::parse(r#"input[type="checkbox"][checked]"#).expect("valid selector");

    let text = cell
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "/");

    if cell.select(&checked_sel).next().is_some() {
        if text.is_empty() {
            "✓".to_string()
        } else {
            format!("✓ {text}")
        }
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
