//! Code-aware strategy (spec §4.3): preserves fenced code blocks and
//! tables as atomic chunks; everything else is packed to fit
//! `max_chunk_size` via the shared size-bounded splitter.

use super::atomic_pack::{self, PackOptions};
use crate::config::ChunkConfig;
use crate::types::{Chunk, ContentAnalysis, ContentType, Strategy};

pub(crate) fn apply(analysis: &ContentAnalysis, config: &ChunkConfig) -> Vec<Chunk> {
    if analysis.text.is_empty() {
        return Vec::new();
    }

    let opts = PackOptions {
        strategy: Strategy::CodeAware,
        text_content_type: ContentType::Text,
        header_path: None,
        header_level: None,
    };

    atomic_pack::pack(analysis, 0, analysis.text.len(), 1, config, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn analyze(text: &str, config: &ChunkConfig) -> ContentAnalysis {
        parser::analyze(text, config)
    }

    #[test]
    fn preserves_fenced_block_as_single_chunk() {
        let text = "Before.\n\n```python\ndef f():\n    return 42\n```\n\nAfter.\n";
        let config = ChunkConfig {
            max_chunk_size: 50,
            ..Default::default()
        }
        .new()
        .unwrap();
        let analysis = analyze(text, &config);
        let chunks = apply(&analysis, &config);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].metadata.content_type, ContentType::Code);
        assert_eq!(chunks[1].metadata.language.as_deref(), Some("python"));
        assert_eq!(chunks[1].metadata.allow_oversize, Some(true));
        assert!(chunks[1].content.starts_with("```python"));
        assert!(chunks[1].content.trim_end().ends_with("```"));
    }

    #[test]
    fn unclosed_fence_still_packed_as_one_chunk() {
        let text = "Text.\n\n```python\nx = 1\n";
        let config = ChunkConfig::default().new().unwrap();
        let analysis = analyze(text, &config);
        let chunks = apply(&analysis, &config);
        let code_chunk = chunks.iter().find(|c| c.metadata.content_type == ContentType::Code).unwrap();
        assert!(code_chunk.content.contains("x = 1"));
    }

    #[test]
    fn table_preserved_as_single_chunk() {
        let text = "Intro.\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\nOutro.\n";
        let config = ChunkConfig::default().new().unwrap();
        let analysis = analyze(text, &config);
        let chunks = apply(&analysis, &config);
        let table_chunk = chunks.iter().find(|c| c.metadata.content_type == ContentType::Table).unwrap();
        assert_eq!(table_chunk.metadata.row_count, Some(3));
        assert_eq!(table_chunk.metadata.column_count, Some(2));
    }
}
