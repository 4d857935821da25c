//! Shared atomic-range packing: walks a (sub-)range of the document left
//! to right, flushing non-atomic text through the size-bounded splitter
//! and emitting each fenced code block / table as exactly one chunk,
//! never splitting across a fence-open/fence-close or table boundary.
//!
//! Used directly by the code-aware strategy (§4.3) for the whole document,
//! and by the structural strategy (§4.4) when a section body must be
//! divided but still contains atomic content.

use super::splitting;
use crate::config::ChunkConfig;
use crate::types::{
    AtomicKind, AtomicRange, Chunk, ChunkMetadata, ContentAnalysis, ContentType, OversizeReason,
    Strategy,
};

pub(crate) struct PackOptions<'a> {
    pub strategy: Strategy,
    pub text_content_type: ContentType,
    pub header_path: Option<&'a str>,
    pub header_level: Option<u8>,
}

/// Pack the byte-offset range `[slice_start, slice_end)` of `analysis.text`,
/// starting at document line `slice_start_line`.
pub(crate) fn pack(
    analysis: &ContentAnalysis,
    slice_start: usize,
    slice_end: usize,
    slice_start_line: usize,
    config: &ChunkConfig,
    opts: &PackOptions,
) -> Vec<Chunk> {
    let text = &analysis.text;
    let ranges: Vec<AtomicRange> = analysis
        .atomic_ranges()
        .into_iter()
        .filter(|r| r.start_offset >= slice_start && r.start_offset < slice_end)
        .collect();

    let mut chunks = Vec::new();
    let mut cursor = slice_start;
    let mut cursor_line = slice_start_line;

    for range in &ranges {
        if range.start_offset > cursor {
            flush_text(&mut chunks, text, cursor, range.start_offset, cursor_line, config, opts);
        }
        emit_atomic(&mut chunks, analysis, range, config, opts);
        cursor = range.end_offset;
        cursor_line = range.end_line + 1;
    }

    if slice_end > cursor {
        flush_text(&mut chunks, text, cursor, slice_end, cursor_line, config, opts);
    }

    chunks
}

fn flush_text(
    chunks: &mut Vec<Chunk>,
    text: &str,
    start: usize,
    end: usize,
    start_line: usize,
    config: &ChunkConfig,
    opts: &PackOptions,
) {
    let buffer = &text[start..end];
    if buffer.trim().is_empty() {
        return;
    }
    for (content, s_line, e_line) in splitting::split_bounded(buffer, start_line, config.max_chunk_size) {
        let mut metadata = ChunkMetadata::new(opts.text_content_type, opts.strategy);
        metadata.header_path = opts.header_path.map(|s| s.to_string());
        metadata.header_level = opts.header_level;
        chunks.push(Chunk::new(content, s_line, e_line, metadata));
    }
}

fn emit_atomic(
    chunks: &mut Vec<Chunk>,
    analysis: &ContentAnalysis,
    range: &AtomicRange,
    config: &ChunkConfig,
    opts: &PackOptions,
) {
    let text = &analysis.text;
    let content = text[range.start_offset..range.end_offset].to_string();
    let size = content.chars().count();

    let content_type = match range.kind {
        AtomicKind::Code => ContentType::Code,
        AtomicKind::Table => ContentType::Table,
    };

    if size > config.max_chunk_size && !config.preserve_atomic_blocks {
        // Atomic preservation disabled: fall through to ordinary splitting.
        for (piece, s_line, e_line) in splitting::split_bounded(&content, range.start_line, config.max_chunk_size)
        {
            let mut metadata = ChunkMetadata::new(content_type, opts.strategy);
            metadata.header_path = opts.header_path.map(|s| s.to_string());
            metadata.header_level = opts.header_level;
            metadata.has_code = matches!(range.kind, AtomicKind::Code);
            chunks.push(Chunk::new(piece, s_line, e_line, metadata));
        }
        return;
    }

    let mut metadata = ChunkMetadata::new(content_type, opts.strategy);
    metadata.header_path = opts.header_path.map(|s| s.to_string());
    metadata.header_level = opts.header_level;
    metadata.has_code = matches!(range.kind, AtomicKind::Code);

    match range.kind {
        AtomicKind::Code => {
            if let Some(fb) = analysis
                .fenced_blocks
                .iter()
                .find(|f| f.start_offset == range.start_offset)
            {
                metadata.language = fb.language.clone();
            }
        }
        AtomicKind::Table => {
            if let Some(tb) = analysis.tables.iter().find(|t| t.start_line == range.start_line) {
                metadata.row_count = Some(tb.rows);
                metadata.column_count = Some(tb.columns);
            }
        }
    }

    if size > config.max_chunk_size {
        metadata.allow_oversize = Some(true);
        metadata.oversize_reason = Some(match range.kind {
            AtomicKind::Code => OversizeReason::CodeBlockIntegrity,
            AtomicKind::Table => OversizeReason::TableIntegrity,
        });
    }

    chunks.push(Chunk::new(content, range.start_line, range.end_line, metadata));
}
