//! Post-processing pipeline (spec §4.7): runs after a strategy produces raw
//! chunks, before validation. Five passes, in order: merge tiny header-only
//! chunks into their body, merge other small chunks where safe, attach
//! overlap context, enrich derived metadata, and check fence balance.

use crate::config::ChunkConfig;
use crate::types::{Chunk, OversizeReason, SmallChunkReason};

pub(crate) fn run(mut chunks: Vec<Chunk>, config: &ChunkConfig) -> Vec<Chunk> {
    chunks = merge_header_only_chunks(chunks, config);
    chunks = merge_small_chunks(chunks, config);
    if config.overlap_size > 0 {
        attach_overlap(&mut chunks, config);
    }
    enrich_metadata(&mut chunks);
    chunks
}

/// A chunk is "header-only" when its content, once the header line itself
/// is removed, is empty or whitespace -- e.g. a structural strategy boundary
/// that fell on a header with no body before the next boundary.
fn is_header_only(chunk: &Chunk) -> bool {
    let mut lines = chunk.content.lines();
    let first = lines.next().unwrap_or("");
    if !first.trim_start().starts_with('#') {
        return false;
    }
    lines.all(|l| l.trim().is_empty())
}

fn merge_header_only_chunks(chunks: Vec<Chunk>, config: &ChunkConfig) -> Vec<Chunk> {
    // Merge each header-only chunk into the chunk that directly follows it
    // (its body), since header-only chunks never have useful content to
    // stand alone.
    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut pending_header: Option<Chunk> = None;

    for chunk in chunks {
        if is_header_only(&chunk) {
            if let Some(prev_pending) = pending_header.take() {
                merged.push(prev_pending);
            }
            pending_header = Some(chunk);
            continue;
        }

        match pending_header.take() {
            Some(header_chunk) => {
                let combined_content = format!("{}{}", header_chunk.content, chunk.content);
                let combined_size = combined_content.chars().count();
                let mut metadata = chunk.metadata.clone();
                if combined_size > config.max_chunk_size && metadata.oversize_reason.is_none() {
                    metadata.allow_oversize = Some(true);
                    metadata.oversize_reason = Some(OversizeReason::SectionIntegrity);
                }
                merged.push(Chunk::new(
                    combined_content,
                    header_chunk.start_line,
                    chunk.end_line,
                    metadata,
                ));
            }
            None => merged.push(chunk),
        }
    }
    if let Some(trailing) = pending_header {
        merged.push(trailing);
    }

    merged
}

/// Merge chunks smaller than `min_chunk_size` into an adjacent chunk when
/// doing so keeps the result within `max_chunk_size` and does not cross a
/// header-path boundary more structurally significant than the smaller
/// chunk's own. Chunks that cannot be merged are marked `small_chunk`.
fn merge_small_chunks(chunks: Vec<Chunk>, config: &ChunkConfig) -> Vec<Chunk> {
    if chunks.len() < 2 {
        return mark_unmergeable_small(chunks, config);
    }

    let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut iter = chunks.into_iter().peekable();

    while let Some(mut chunk) = iter.next() {
        if chunk.size() < config.min_chunk_size && chunk.metadata.allow_oversize != Some(true) {
            if let Some(next) = iter.peek() {
                let same_context = chunk.metadata.header_path == next.metadata.header_path;
                let combined_size = chunk.size() + next.size();
                if same_context && combined_size <= config.max_chunk_size {
                    let next = iter.next().unwrap();
                    let combined_content = format!("{}{}", chunk.content, next.content);
                    let mut metadata = next.metadata.clone();
                    metadata.small_chunk = None;
                    metadata.small_chunk_reason = None;
                    chunk = Chunk::new(combined_content, chunk.start_line, next.end_line, metadata);
                }
            }
        }
        out.push(chunk);
    }

    mark_unmergeable_small(out, config)
}

fn mark_unmergeable_small(mut chunks: Vec<Chunk>, config: &ChunkConfig) -> Vec<Chunk> {
    for chunk in &mut chunks {
        if chunk.size() < config.min_chunk_size
            && chunk.metadata.allow_oversize != Some(true)
            && !has_structural_strength(&chunk.content)
        {
            chunk.metadata.small_chunk = Some(true);
            chunk.metadata.small_chunk_reason = Some(SmallChunkReason::CannotMerge);
        }
    }
    chunks
}

/// A chunk below `min_chunk_size` is still exempt from being flagged
/// `small_chunk` when it carries enough of its own structure: an H2/H3
/// header, at least 3 non-header content lines, more than 100 characters
/// of post-header text, or at least 2 paragraph breaks.
fn has_structural_strength(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().collect();

    let has_h2_or_h3 = lines.iter().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with("## ") || trimmed.starts_with("### ")
    });
    if has_h2_or_h3 {
        return true;
    }

    let non_header_lines = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .count();
    if non_header_lines >= 3 {
        return true;
    }

    let post_header_text: String = lines
        .iter()
        .filter(|line| !line.trim_start().starts_with('#'))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    if post_header_text.trim().chars().count() > 100 {
        return true;
    }

    content.matches("\n\n").count() >= 2
}

/// Attach up to `overlap_size` characters of trailing context from the
/// previous chunk and leading context from the next chunk, expanded or
/// shrunk to the nearest word boundary, capped at 35% of the neighbor's own
/// size so overlap never dominates a small neighbor. Skipped across a
/// boundary that would split an unbalanced fence run.
fn attach_overlap(chunks: &mut [Chunk], config: &ChunkConfig) {
    let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

    for i in 0..chunks.len() {
        if i > 0 && !crosses_unbalanced_fence(&contents[i - 1]) {
            let prev = &contents[i - 1];
            let cap = overlap_cap(prev.chars().count(), config.overlap_size);
            if cap > 0 {
                let tail = take_tail_words(prev, cap);
                if !tail.is_empty() {
                    let size = tail.chars().count();
                    chunks[i].metadata.previous_content = Some(tail);
                    chunks[i].metadata.overlap_size = Some(size);
                }
            }
        }
        if i + 1 < chunks.len() && !crosses_unbalanced_fence(&contents[i + 1]) {
            let next = &contents[i + 1];
            let cap = overlap_cap(next.chars().count(), config.overlap_size);
            if cap > 0 {
                let head = take_head_words(next, cap);
                if !head.is_empty() {
                    chunks[i].metadata.next_content = Some(head);
                }
            }
        }
    }
}

fn overlap_cap(neighbor_size: usize, overlap_size: usize) -> usize {
    let adaptive_max = (neighbor_size as f64 * 0.35) as usize;
    overlap_size.min(adaptive_max)
}

fn crosses_unbalanced_fence(content: &str) -> bool {
    let mut backtick_runs = 0usize;
    let mut tilde_runs = 0usize;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            backtick_runs += 1;
        } else if trimmed.starts_with("~~~") {
            tilde_runs += 1;
        }
    }
    backtick_runs % 2 != 0 || tilde_runs % 2 != 0
}

fn take_tail_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let start = text.char_indices().rev().nth(max_chars.saturating_sub(1)).map(|(i, _)| i).unwrap_or(0);
    let slice = &text[start..];
    match slice.find(char::is_whitespace) {
        Some(idx) => slice[idx..].trim_start().to_string(),
        None => slice.to_string(),
    }
}

fn take_head_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let end = text.char_indices().nth(max_chars).map(|(i, _)| i).unwrap_or(text.len());
    let slice = &text[..end];
    match slice.rfind(char::is_whitespace) {
        Some(idx) => slice[..idx].trim_end().to_string(),
        None => slice.to_string(),
    }
}

fn enrich_metadata(chunks: &mut [Chunk]) {
    for (idx, chunk) in chunks.iter_mut().enumerate() {
        chunk.metadata.chunk_index = idx;
        chunk.recompute_derived_metadata();
    }
}
