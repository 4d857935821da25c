//! Shared size-bounded text splitting primitive (spec §4.6): splits text
//! at the best available boundary -- paragraph, then sentence, then word,
//! then a hard character cut -- so every resulting piece fits within
//! `max_chunk_size` characters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

static PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n+").unwrap());
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?]+)(\s+)").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Paragraph,
    Sentence,
    Word,
    HardCut,
}

impl Boundary {
    fn next(self) -> Self {
        match self {
            Boundary::Paragraph => Boundary::Sentence,
            Boundary::Sentence => Boundary::Word,
            Boundary::Word => Boundary::HardCut,
            Boundary::HardCut => Boundary::HardCut,
        }
    }
}

/// Split `text` into `(content, start_line, end_line)` pieces, none
/// exceeding `max_chunk_size` characters. `start_line` is the 1-based line
/// number of `text`'s first line within the original document.
pub(crate) fn split_bounded(text: &str, start_line: usize, max_chunk_size: usize) -> Vec<(String, usize, usize)> {
    let mut out = Vec::new();
    if text.is_empty() || max_chunk_size == 0 {
        return out;
    }

    let mut work: VecDeque<(usize, usize, Boundary)> = VecDeque::new();
    work.push_back((0, text.len(), Boundary::Paragraph));

    while let Some((s, e, boundary)) = work.pop_front() {
        if e <= s {
            continue;
        }
        let piece = &text[s..e];
        if piece.trim().is_empty() {
            continue;
        }
        let size = piece.chars().count();
        if size <= max_chunk_size {
            push_piece(&mut out, text, start_line, s, e);
            continue;
        }
        if boundary == Boundary::HardCut {
            hard_cut_push(&mut out, text, start_line, s, e, max_chunk_size);
            continue;
        }

        let pieces = match boundary {
            Boundary::Paragraph => split_on(piece, &PARAGRAPH_RE),
            Boundary::Sentence => split_sentences(piece),
            Boundary::Word => split_on(piece, &WORD_RE),
            Boundary::HardCut => unreachable!(),
        };

        if pieces.len() <= 1 {
            // No boundary of this kind found; escalate directly.
            work.push_front((s, e, boundary.next()));
            continue;
        }

        let absolute: Vec<(usize, usize)> = pieces.into_iter().map(|(a, b)| (a + s, b + s)).collect();
        let packed = greedy_pack(text, &absolute, max_chunk_size);
        for (ps, pe) in packed.into_iter().rev() {
            work.push_front((ps, pe, boundary.next()));
        }
    }

    out
}

fn split_on(text: &str, re: &Regex) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut prev = 0usize;
    for m in re.find_iter(text) {
        if m.start() > prev {
            pieces.push((prev, m.start()));
        }
        prev = m.end();
    }
    if prev < text.len() {
        pieces.push((prev, text.len()));
    }
    pieces
}

fn split_sentences(text: &str) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut prev = 0usize;
    for caps in SENTENCE_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let punctuation = caps.get(1).unwrap();
        if punctuation.end() > prev {
            pieces.push((prev, punctuation.end()));
        }
        prev = whole.end();
    }
    if prev < text.len() {
        pieces.push((prev, text.len()));
    }
    pieces
}

/// Greedily merge adjacent pieces while the combined span stays within
/// `max_chunk_size`.
fn greedy_pack(text: &str, pieces: &[(usize, usize)], max_chunk_size: usize) -> Vec<(usize, usize)> {
    let mut result = Vec::new();
    let mut cur: Option<(usize, usize)> = None;

    for &(s, e) in pieces {
        match cur {
            None => cur = Some((s, e)),
            Some((cs, _)) => {
                let combined_size = text[cs..e].chars().count();
                if combined_size <= max_chunk_size {
                    cur = Some((cs, e));
                } else {
                    result.push(cur.take().unwrap());
                    cur = Some((s, e));
                }
            }
        }
    }
    if let Some(c) = cur {
        result.push(c);
    }
    result
}

fn push_piece(out: &mut Vec<(String, usize, usize)>, text: &str, start_line: usize, s: usize, e: usize) {
    let content = &text[s..e];
    if content.trim().is_empty() {
        return;
    }
    let start_l = start_line + text[..s].matches('\n').count();
    let trimmed = content.strip_suffix('\n').unwrap_or(content);
    let end_l = start_l + trimmed.matches('\n').count();
    out.push((content.to_string(), start_l, end_l));
}

fn hard_cut_push(
    out: &mut Vec<(String, usize, usize)>,
    text: &str,
    start_line: usize,
    s: usize,
    e: usize,
    max_chunk_size: usize,
) {
    let mut offset = s;
    while offset < e {
        let remaining = &text[offset..e];
        let cut_at = nth_char_boundary(remaining, max_chunk_size);
        let abs_cut = offset + cut_at.max(1);
        push_piece(out, text, start_line, offset, abs_cut.min(e));
        offset = abs_cut.min(e);
    }
}

/// Byte offset within `s` right after its `n`th character (or `s.len()` if
/// `s` has fewer than `n` characters).
fn nth_char_boundary(s: &str, n: usize) -> usize {
    s.char_indices()
        .nth(n)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_small_piece_unsplit() {
        let pieces = split_bounded("hello world", 1, 100);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].0, "hello world");
    }

    #[test]
    fn splits_on_paragraph_boundary() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let pieces = split_bounded(text, 1, 25);
        assert!(pieces.len() >= 2);
        for (content, _, _) in &pieces {
            assert!(content.chars().count() <= 25);
        }
    }

    #[test]
    fn falls_back_to_sentence_then_word_then_hard_cut() {
        let long_word = "a".repeat(50);
        let text = format!("Sentence one is fine. {long_word} more text after.");
        let pieces = split_bounded(&text, 1, 20);
        for (content, _, _) in &pieces {
            assert!(content.chars().count() <= 20, "piece too large: {content}");
        }
    }

    #[test]
    fn line_numbers_track_newlines() {
        let text = "line one\nline two\nline three";
        let pieces = split_bounded(text, 5, 9);
        assert_eq!(pieces[0].1, 5);
        assert!(pieces.last().unwrap().2 >= pieces.last().unwrap().1);
    }

    #[test]
    fn empty_text_yields_no_pieces() {
        assert!(split_bounded("", 1, 100).is_empty());
        assert!(split_bounded("   \n\n  ", 1, 100).is_empty());
    }
}
