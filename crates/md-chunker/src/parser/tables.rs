use super::LineInfo;
use crate::types::TableBlock;
use once_cell::sync::Lazy;
use regex::Regex;

static ALIGNMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|?(\s*:?-{3,}:?\s*\|)+\s*:?-{3,}:?\s*\|?\s*$").unwrap());

/// Detect Markdown tables outside fenced blocks: a header row containing
/// `|`, followed immediately by an alignment row, followed by data rows
/// until a blank line, a non-pipe line, or a fenced region is hit.
pub(crate) fn scan_tables(lines: &[LineInfo<'_>], outside: &[bool]) -> Vec<TableBlock> {
    let mut tables = Vec::new();
    let mut i = 0usize;

    while i + 1 < lines.len() {
        if !outside[i] || !outside[i + 1] {
            i += 1;
            continue;
        }

        let header_line = lines[i].line;
        let alignment_line = lines[i + 1].line;

        if has_unescaped_pipe(header_line) && ALIGNMENT_RE.is_match(alignment_line) {
            let columns = count_alignment_columns(alignment_line);
            let mut j = i + 2;
            while j < lines.len() && outside[j] && is_table_row(lines[j].line) {
                j += 1;
            }
            let start_line = i + 1;
            let end_line = j;
            tables.push(TableBlock {
                start_line,
                end_line,
                rows: end_line - start_line + 1,
                columns,
            });
            i = j;
        } else {
            i += 1;
        }
    }

    tables
}

fn has_unescaped_pipe(line: &str) -> bool {
    let bytes = line.as_bytes();
    for (idx, &b) in bytes.iter().enumerate() {
        if b == b'|' && (idx == 0 || bytes[idx - 1] != b'\\') {
            return true;
        }
    }
    false
}

fn is_table_row(line: &str) -> bool {
    !line.trim().is_empty() && has_unescaped_pipe(line)
}

fn count_alignment_columns(line: &str) -> usize {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').filter(|s| !s.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::index_lines;

    #[test]
    fn detects_simple_table() {
        let text = "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let tables = scan_tables(&lines, &outside);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns, 2);
        assert_eq!(tables[0].rows, 4);
        assert_eq!(tables[0].start_line, 1);
        assert_eq!(tables[0].end_line, 4);
    }

    #[test]
    fn table_ends_at_blank_line() {
        let text = "| A |\n|---|\n| 1 |\n\n| not a table row\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let tables = scan_tables(&lines, &outside);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].end_line, 3);
    }

    #[test]
    fn requires_alignment_row_to_match() {
        let text = "| A | B |\nnot alignment\n| 1 | 2 |\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let tables = scan_tables(&lines, &outside);
        assert!(tables.is_empty());
    }

    #[test]
    fn two_row_minimum_header_plus_alignment() {
        let text = "| A | B |\n|---|---|\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let tables = scan_tables(&lines, &outside);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, 2);
    }
}
