//! Single-pass structural analyzer: normalizes line endings, detects
//! fenced code blocks (with nesting), headers, tables, lists, and the
//! document preamble, producing a [`ContentAnalysis`].
//!
//! The parser never fails — every input, including empty or malformed
//! Markdown, yields a valid (possibly empty) analysis.

mod fences;
mod headers;
mod lists;
mod tables;

use crate::config::ChunkConfig;
use crate::types::ContentAnalysis;
use once_cell::sync::Lazy;
use regex::Regex;

/// A line of the normalized document, with its byte offset into the
/// normalized text (not including the trailing newline).
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineInfo<'a> {
    pub start_offset: usize,
    pub line: &'a str,
}

static BLOCK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]\^[A-Za-z0-9_-]+[ \t]*$").unwrap());

/// CRLF/CR -> LF normalization, applied before any scanning.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strip trailing Obsidian-style block identifiers (`^abc123`) at end of
/// line. Only matches when preceded by whitespace, so it never eats mid-
/// line carets.
fn strip_block_identifiers(text: &str) -> String {
    BLOCK_ID_RE.replace_all(text, "").to_string()
}

pub(crate) fn index_lines(text: &str) -> Vec<LineInfo<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    for raw in text.split_inclusive('\n') {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        lines.push(LineInfo {
            start_offset: offset,
            line,
        });
        offset += raw.len();
    }
    if text.is_empty() {
        lines.push(LineInfo {
            start_offset: 0,
            line: "",
        });
    }
    lines
}

/// Run the full structural scan and produce a [`ContentAnalysis`].
pub fn analyze(raw_text: &str, config: &ChunkConfig) -> ContentAnalysis {
    let mut text = normalize_line_endings(raw_text);
    if config.strip_block_identifiers {
        text = strip_block_identifiers(&text);
    }

    if text.is_empty() {
        return ContentAnalysis {
            text,
            ..Default::default()
        };
    }

    let lines = index_lines(&text);
    let total_lines = lines.len();
    let total_chars = text.chars().count();

    let (fenced_blocks, outside) = fences::scan_fences(&text, &lines);
    let headers = headers::scan_headers(&lines, &outside);
    let tables = tables::scan_tables(&lines, &outside);
    let lists = lists::scan_lists(&lines, &outside);

    let code_chars: usize = fenced_blocks.iter().map(|b| b.content.chars().count()).sum();
    let code_ratio = if total_chars == 0 {
        0.0
    } else {
        (code_chars as f64 / total_chars as f64).min(1.0)
    };

    let header_count = headers.len();
    let max_header_depth = headers.iter().map(|h| h.level).max().unwrap_or(0);
    let table_count = tables.len();
    let list_count = lists.len();

    let preamble_range = compute_preamble_range(&lines, &headers);

    let complexity_score = compute_complexity_score(
        code_ratio,
        max_header_depth,
        table_count,
        list_count,
        total_lines,
    );

    log::trace!(
        "parsed document: {} lines, {} headers, {} fences, {} tables, {} lists",
        total_lines,
        header_count,
        fenced_blocks.len(),
        table_count,
        list_count
    );

    ContentAnalysis {
        text,
        total_chars,
        total_lines,
        headers,
        fenced_blocks,
        tables,
        lists,
        code_ratio,
        header_count,
        max_header_depth,
        table_count,
        list_count,
        complexity_score,
        preamble_range,
    }
}

fn compute_preamble_range(
    lines: &[LineInfo<'_>],
    headers: &[crate::types::Header],
) -> Option<(usize, usize)> {
    let first_header = headers.first()?;
    if first_header.line <= 1 {
        return None;
    }
    let preamble_lines = &lines[0..(first_header.line - 1)];
    let has_content = preamble_lines.iter().any(|l| !l.line.trim().is_empty());
    if has_content {
        Some((1, first_header.line - 1))
    } else {
        None
    }
}

fn compute_complexity_score(
    code_ratio: f64,
    max_header_depth: u8,
    table_count: usize,
    list_count: usize,
    total_lines: usize,
) -> f64 {
    let lines = total_lines.max(1) as f64;
    let header_component = (max_header_depth as f64 / 6.0).min(1.0);
    let table_component = (table_count as f64 / lines).min(1.0);
    let list_component = (list_count as f64 / lines).min(1.0);

    let score =
        0.35 * code_ratio + 0.25 * header_component + 0.2 * table_component + 0.2 * list_component;
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_analysis() {
        let analysis = analyze("", &ChunkConfig::default());
        assert_eq!(analysis.total_lines, 0);
        assert!(analysis.headers.is_empty());
    }

    #[test]
    fn normalizes_crlf_and_cr() {
        let lf = analyze("a\nb\n", &ChunkConfig::default());
        let crlf = analyze("a\r\nb\r\n", &ChunkConfig::default());
        let cr = analyze("a\rb\r", &ChunkConfig::default());
        assert_eq!(lf.text, crlf.text);
        assert_eq!(lf.text, cr.text);
    }

    #[test]
    fn detects_preamble_range() {
        let text = "Intro text.\n\n# Title\n\nBody.\n";
        let analysis = analyze(text, &ChunkConfig::default());
        assert_eq!(analysis.preamble_range, Some((1, 2)));
    }

    #[test]
    fn no_preamble_when_header_is_first_line() {
        let text = "# Title\n\nBody.\n";
        let analysis = analyze(text, &ChunkConfig::default());
        assert_eq!(analysis.preamble_range, None);
    }

    #[test]
    fn no_preamble_when_no_headers_at_all() {
        let text = "Just some text.\nAnd more.\n";
        let analysis = analyze(text, &ChunkConfig::default());
        assert_eq!(analysis.preamble_range, None);
    }

    #[test]
    fn strips_block_identifiers_when_enabled() {
        let config = ChunkConfig {
            strip_block_identifiers: true,
            ..Default::default()
        };
        let analysis = analyze("Some text ^block-id1\nOther ^not-at-mid^dle text\n", &config);
        assert!(analysis.text.contains("Some text\n"));
        assert!(analysis.text.contains("^not-at-mid^dle"));
    }
}
