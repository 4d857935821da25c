use super::LineInfo;
use crate::types::ListBlock;
use once_cell::sync::Lazy;
use regex::Regex;

static UNORDERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^( *)([-*+]) +").unwrap());
static ORDERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^( *)(\d+)[.)] +").unwrap());

struct Marker {
    indent: usize,
    ordered: bool,
}

fn match_marker(line: &str) -> Option<Marker> {
    if let Some(caps) = UNORDERED_RE.captures(line) {
        return Some(Marker {
            indent: caps[1].len(),
            ordered: false,
        });
    }
    if let Some(caps) = ORDERED_RE.captures(line) {
        return Some(Marker {
            indent: caps[1].len(),
            ordered: true,
        });
    }
    None
}

/// Detect list runs outside fenced blocks: maximal sequences of list-
/// marker lines separated by at most one blank line. Depth is derived
/// from indentation (2 or 4 spaces per nesting level).
pub(crate) fn scan_lists(lines: &[LineInfo<'_>], outside: &[bool]) -> Vec<ListBlock> {
    let mut lists = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        if !outside[i] {
            i += 1;
            continue;
        }
        let Some(first) = match_marker(lines[i].line) else {
            i += 1;
            continue;
        };

        let start = i;
        let ordered = first.ordered;
        let mut max_indent = first.indent;
        let mut j = i + 1;
        let mut blank_run = 0usize;

        while j < lines.len() && outside[j] {
            let line = lines[j].line;
            if line.trim().is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    break;
                }
                j += 1;
                continue;
            }
            match match_marker(line) {
                Some(m) => {
                    blank_run = 0;
                    max_indent = max_indent.max(m.indent);
                    j += 1;
                }
                None => break,
            }
        }

        // Don't let a trailing blank line included in the lookahead count
        // toward the run's end line.
        let mut end = j;
        while end > start + 1 && lines[end - 1].line.trim().is_empty() {
            end -= 1;
        }

        let max_depth = (max_indent / 2).min(u8::MAX as usize) as u8 + 1;

        lists.push(ListBlock {
            start_line: start + 1,
            end_line: end,
            ordered,
            max_depth,
        });

        i = j;
    }

    lists
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::index_lines;

    #[test]
    fn detects_simple_unordered_list() {
        let text = "- one\n- two\n- three\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let lists = scan_lists(&lines, &outside);
        assert_eq!(lists.len(), 1);
        assert!(!lists[0].ordered);
        assert_eq!(lists[0].start_line, 1);
        assert_eq!(lists[0].end_line, 3);
    }

    #[test]
    fn detects_ordered_list() {
        let text = "1. one\n2. two\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let lists = scan_lists(&lines, &outside);
        assert_eq!(lists.len(), 1);
        assert!(lists[0].ordered);
    }

    #[test]
    fn nested_list_increases_depth() {
        let text = "- one\n  - nested\n- two\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let lists = scan_lists(&lines, &outside);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].max_depth, 2);
    }

    #[test]
    fn single_blank_line_does_not_break_run() {
        let text = "- one\n\n- two\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let lists = scan_lists(&lines, &outside);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].end_line, 3);
    }

    #[test]
    fn two_blank_lines_end_the_run() {
        let text = "- one\n\n\n- two\n";
        let lines = index_lines(text);
        let outside = vec![true; lines.len()];
        let lists = scan_lists(&lines, &outside);
        assert_eq!(lists.len(), 2);
    }
}
