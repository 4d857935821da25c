use super::LineInfo;
use crate::types::{FenceChar, FencedBlock};

const MAX_FENCE_INDENT: usize = 3;

struct FenceFrame {
    fence_char: FenceChar,
    fence_length: u8,
}

struct OuterFence {
    fence_char: FenceChar,
    fence_length: u8,
    info_string: Option<String>,
    start_line: usize,
    start_offset: usize,
    /// offset right after the opening fence line's newline; start of inner content
    content_start_offset: usize,
}

/// Scan for fenced code blocks, honoring arbitrary nesting of backtick/
/// tilde fences of length 3-5. Returns the list of *outermost* fenced
/// blocks plus a per-line mask of which lines are outside every fence
/// (and not themselves a fence delimiter line) -- i.e. eligible for
/// header/table/list detection.
pub(crate) fn scan_fences(text: &str, lines: &[LineInfo<'_>]) -> (Vec<FencedBlock>, Vec<bool>) {
    let mut blocks = Vec::new();
    let mut outside = vec![true; lines.len()];
    let mut stack: Vec<FenceFrame> = Vec::new();
    let mut outer: Option<OuterFence> = None;

    for (idx, li) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_end_offset = li.start_offset + li.line.len();

        if let Some(top) = stack.last() {
            if let Some(close_len) = try_fence_close(li.line, top.fence_char, top.fence_length) {
                let _ = close_len;
                stack.pop();
                outside[idx] = false;
                if stack.is_empty() {
                    if let Some(o) = outer.take() {
                        let inner = &text[o.content_start_offset..li.start_offset];
                        blocks.push(finish_block(o, inner.to_string(), line_no, line_end_offset, true));
                    }
                }
                continue;
            }
        }

        if let Some((fc, len, info)) = try_fence_open(li.line) {
            outside[idx] = false;
            if stack.is_empty() {
                outer = Some(OuterFence {
                    fence_char: fc,
                    fence_length: len,
                    info_string: info,
                    start_line: line_no,
                    start_offset: li.start_offset,
                    content_start_offset: line_end_offset + newline_len(text, line_end_offset),
                });
            }
            stack.push(FenceFrame {
                fence_char: fc,
                fence_length: len,
            });
            continue;
        }

        if !stack.is_empty() {
            outside[idx] = false;
        }
    }

    // Unclosed fences reach EOF.
    if let Some(o) = outer.take() {
        let last_line = lines.len();
        let inner = &text[o.content_start_offset.min(text.len())..text.len()];
        blocks.push(finish_block(o, inner.to_string(), last_line, text.len(), false));
    }

    (blocks, outside)
}

fn newline_len(text: &str, offset: usize) -> usize {
    if text[offset..].starts_with('\n') {
        1
    } else {
        0
    }
}

fn finish_block(
    o: OuterFence,
    inner: String,
    end_line: usize,
    end_offset: usize,
    closed: bool,
) -> FencedBlock {
    let language = o
        .info_string
        .as_ref()
        .and_then(|s| s.split_whitespace().next())
        .map(|s| s.to_string());
    FencedBlock {
        fence_char: o.fence_char,
        fence_length: o.fence_length,
        info_string: o.info_string,
        language,
        content: inner,
        start_line: o.start_line,
        end_line,
        start_offset: o.start_offset,
        end_offset,
        closed,
    }
}

/// Leading-whitespace-stripped run of an identical fence character, length
/// 3-5, at the start of `line` (after at most 3 leading spaces).
fn try_fence_open(line: &str) -> Option<(FenceChar, u8, Option<String>)> {
    let indent = leading_spaces(line);
    if indent > MAX_FENCE_INDENT {
        return None;
    }
    let rest = &line[indent..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    let fc = FenceChar::from_char(first)?;

    let run_len = rest.chars().take_while(|&c| c == first).count();
    if !(3..=5).contains(&run_len) {
        return None;
    }

    let after = &rest[run_len..];
    // A backtick fence's info string may not itself contain a backtick.
    if fc == FenceChar::Backtick && after.contains('`') {
        return None;
    }

    let info = after.trim().to_string();
    Some((fc, run_len as u8, if info.is_empty() { None } else { Some(info) }))
}

/// Whether `line` closes a fence opened with `fence_char`/`opening_length`.
fn try_fence_close(line: &str, fence_char: FenceChar, opening_length: u8) -> Option<u8> {
    let indent = leading_spaces(line);
    if indent > MAX_FENCE_INDENT {
        return None;
    }
    let rest = &line[indent..];
    let mut chars = rest.chars();
    let first = chars.next()?;
    if FenceChar::from_char(first)? != fence_char {
        return None;
    }

    let run_len = rest.chars().take_while(|&c| c == first).count();
    if (run_len as u8) < opening_length {
        return None;
    }

    let after = &rest[run_len..];
    if !after.trim().is_empty() {
        return None;
    }
    Some(run_len as u8)
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|&c| c == ' ').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::index_lines;

    fn run(text: &str) -> (Vec<FencedBlock>, Vec<bool>) {
        let lines = index_lines(text);
        scan_fences(text, &lines)
    }

    #[test]
    fn simple_backtick_block() {
        let text = "Before.\n\n```python\ndef f():\n    return 42\n```\n\nAfter.\n";
        let (blocks, _) = run(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language.as_deref(), Some("python"));
        assert!(blocks[0].closed);
        assert_eq!(blocks[0].start_line, 3);
        assert_eq!(blocks[0].end_line, 6);
    }

    #[test]
    fn nested_fences_produce_one_outer_block() {
        let text = "~~~markdown\n# Outer\n\n```python\nprint(\"inner\")\n```\n\nStill outer.\n~~~\n";
        let (blocks, _) = run(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].fence_char, FenceChar::Tilde);
        assert_eq!(blocks[0].language.as_deref(), Some("markdown"));
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].end_line, 9);
        assert!(blocks[0].content.contains("```python"));
    }

    #[test]
    fn unclosed_fence_spans_to_eof() {
        let text = "Text.\n\n```python\nx = 1\n";
        let (blocks, _) = run(text);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].closed);
        assert_eq!(blocks[0].start_line, 3);
        assert_eq!(blocks[0].end_line, 4);
    }

    #[test]
    fn shorter_fence_does_not_close_longer_opener() {
        let text = "````\ncode\n```\nmore\n````\n";
        let (blocks, _) = run(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 1);
        assert_eq!(blocks[0].end_line, 5);
    }

    #[test]
    fn different_fence_char_never_closes() {
        let text = "```\ntext\n~~~\nmore\n```\n";
        let (blocks, _) = run(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 5);
    }
}
