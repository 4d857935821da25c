//! Fallback strategy (spec §4.5): the safety net. Always succeeds, via the
//! shared size-bounded splitting primitive with no structural awareness.

use super::splitting;
use crate::config::ChunkConfig;
use crate::types::{Chunk, ChunkMetadata, ContentAnalysis, ContentType, Strategy};

pub(crate) fn apply(analysis: &ContentAnalysis, config: &ChunkConfig) -> Vec<Chunk> {
    if analysis.text.trim().is_empty() {
        return Vec::new();
    }

    splitting::split_bounded(&analysis.text, 1, config.max_chunk_size)
        .into_iter()
        .map(|(content, start_line, end_line)| {
            Chunk::new(
                content,
                start_line,
                end_line,
                ChunkMetadata::new(ContentType::Text, Strategy::Fallback),
            )
        })
        .collect()
}
