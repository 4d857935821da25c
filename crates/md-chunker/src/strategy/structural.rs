//! Structural strategy (spec §4.4): chunks along header boundaries,
//! attaching header-path and section-tag context.

use super::atomic_pack::{self, PackOptions};
use crate::config::ChunkConfig;
use crate::types::{line_range_to_offsets, Chunk, ChunkMetadata, ContentAnalysis, ContentType, Header, Strategy};

/// Headers at or above this level partition the document into sections.
/// Fixed per the spec's resolution of the "max_structural_level" open
/// question; not exposed as a config knob.
const MAX_STRUCTURAL_LEVEL: u8 = 2;

pub(crate) fn apply(analysis: &ContentAnalysis, config: &ChunkConfig) -> Vec<Chunk> {
    if analysis.text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();

    if config.extract_preamble {
        if let Some((ps, pe)) = analysis.preamble_range {
            if let Some(content) = slice_lines(&analysis.text, ps, pe) {
                if !content.trim().is_empty() {
                    let mut metadata = ChunkMetadata::new(ContentType::Preamble, Strategy::Structural);
                    metadata.header_path = Some("/__preamble__".to_string());
                    chunks.push(Chunk::new(content, ps, pe, metadata));
                }
            }
        }
    }

    let mut boundary_headers: Vec<&Header> =
        analysis.headers.iter().filter(|h| h.level <= MAX_STRUCTURAL_LEVEL).collect();

    if boundary_headers.is_empty() {
        let body_start_line = match (config.extract_preamble, analysis.preamble_range) {
            (true, Some((_, pe))) => pe + 1,
            _ => 1,
        };
        if body_start_line <= analysis.total_lines {
            if let Some(body) = slice_from_line(&analysis.text, body_start_line) {
                if !body.trim().is_empty() {
                    let (slice_start, slice_end) =
                        line_range_to_offsets(&analysis.text, body_start_line, analysis.total_lines);
                    let opts = PackOptions {
                        strategy: Strategy::Structural,
                        text_content_type: ContentType::Text,
                        header_path: None,
                        header_level: None,
                    };
                    chunks.extend(atomic_pack::pack(
                        analysis,
                        slice_start,
                        slice_end,
                        body_start_line,
                        config,
                        &opts,
                    ));
                }
            }
        }
        return chunks;
    }

    boundary_headers.sort_by_key(|h| h.line);
    let mut stack: Vec<&Header> = Vec::new();

    for (idx, header) in boundary_headers.iter().enumerate() {
        while let Some(top) = stack.last() {
            if top.level >= header.level {
                stack.pop();
            } else {
                break;
            }
        }
        stack.push(header);

        let header_path = "/".to_string()
            + &stack.iter().map(|h| h.text.clone()).collect::<Vec<_>>().join("/");

        let section_start_line = header.line;
        let section_end_line = boundary_headers
            .get(idx + 1)
            .map(|h| h.line - 1)
            .unwrap_or(analysis.total_lines);

        let section_tags: Vec<String> = analysis
            .headers
            .iter()
            .filter(|h| h.line > section_start_line && h.line <= section_end_line)
            .map(|h| h.text.clone())
            .collect();

        let Some(body) = slice_lines(&analysis.text, section_start_line, section_end_line) else {
            continue;
        };
        if body.trim().is_empty() {
            continue;
        }

        let body_size = body.chars().count();
        if body_size <= config.max_chunk_size {
            let mut metadata = ChunkMetadata::new(ContentType::Section, Strategy::Structural);
            metadata.header_path = Some(header_path);
            metadata.header_level = Some(header.level);
            metadata.section_tags = dedup_preserve_order(section_tags);
            chunks.push(Chunk::new(body, section_start_line, section_end_line, metadata));
        } else {
            chunks.extend(split_section_body(
                analysis,
                section_start_line,
                section_end_line,
                &header_path,
                header.level,
                &section_tags,
                config,
            ));
        }
    }

    chunks
}

/// Split an over-size section body: first try sub-header boundaries one
/// level deeper than the section's own header, preserving atomic content;
/// failing that, apply the shared size-bounded text splitter (still
/// atomic-aware).
#[allow(clippy::too_many_arguments)]
fn split_section_body(
    analysis: &ContentAnalysis,
    start_line: usize,
    end_line: usize,
    header_path: &str,
    header_level: u8,
    inherited_tags: &[String],
    config: &ChunkConfig,
) -> Vec<Chunk> {
    let next_level = header_level + 1;
    let mut sub_headers: Vec<&Header> = analysis
        .headers
        .iter()
        .filter(|h| h.line > start_line && h.line <= end_line && h.level == next_level)
        .collect();

    if sub_headers.is_empty() {
        // No header at exactly the next level; use whatever the shallowest
        // nested header level present is, if any.
        let nested: Vec<&Header> = analysis
            .headers
            .iter()
            .filter(|h| h.line > start_line && h.line <= end_line)
            .collect();
        if let Some(min_level) = nested.iter().map(|h| h.level).min() {
            sub_headers = nested.into_iter().filter(|h| h.level == min_level).collect();
        }
    }

    if sub_headers.is_empty() {
        return pack_section_slice(analysis, start_line, end_line, header_path, header_level, inherited_tags, config);
    }

    let mut boundaries: Vec<usize> = sub_headers.iter().map(|h| h.line).collect();
    boundaries.push(end_line + 1);

    let mut chunks = Vec::new();
    let mut cur = start_line;
    for boundary in boundaries {
        if boundary > cur {
            let seg_end = boundary - 1;
            let local_tags: Vec<String> = analysis
                .headers
                .iter()
                .filter(|h| h.line >= cur && h.line <= seg_end && h.line > start_line)
                .map(|h| h.text.clone())
                .collect();
            let tags = merge_tags(inherited_tags, &local_tags);

            if let Some(seg_body) = slice_lines(&analysis.text, cur, seg_end) {
                if !seg_body.trim().is_empty() {
                    let seg_size = seg_body.chars().count();
                    if seg_size <= config.max_chunk_size {
                        let mut metadata = ChunkMetadata::new(ContentType::Section, Strategy::Structural);
                        metadata.header_path = Some(header_path.to_string());
                        metadata.header_level = Some(header_level);
                        metadata.section_tags = dedup_preserve_order(tags);
                        chunks.push(Chunk::new(seg_body, cur, seg_end, metadata));
                    } else {
                        chunks.extend(pack_section_slice(
                            analysis,
                            cur,
                            seg_end,
                            header_path,
                            header_level,
                            &tags,
                            config,
                        ));
                    }
                }
            }
        }
        cur = boundary;
    }

    chunks
}

fn pack_section_slice(
    analysis: &ContentAnalysis,
    start_line: usize,
    end_line: usize,
    header_path: &str,
    header_level: u8,
    tags: &[String],
    config: &ChunkConfig,
) -> Vec<Chunk> {
    let (slice_start, slice_end) = line_range_to_offsets(&analysis.text, start_line, end_line);
    let opts = PackOptions {
        strategy: Strategy::Structural,
        text_content_type: ContentType::Section,
        header_path: Some(header_path),
        header_level: Some(header_level),
    };
    let mut chunks = atomic_pack::pack(analysis, slice_start, slice_end, start_line, config, &opts);
    let deduped = dedup_preserve_order(tags.to_vec());
    for chunk in &mut chunks {
        chunk.metadata.section_tags = deduped.clone();
    }
    chunks
}

fn merge_tags(a: &[String], b: &[String]) -> Vec<String> {
    let mut out = a.to_vec();
    out.extend(b.iter().cloned());
    out
}

fn dedup_preserve_order(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

fn slice_lines(text: &str, start_line: usize, end_line: usize) -> Option<String> {
    let (s, e) = line_range_to_offsets(text, start_line, end_line);
    if s >= e {
        return None;
    }
    Some(text[s..e].to_string())
}

fn slice_from_line(text: &str, start_line: usize) -> Option<String> {
    let total_lines = text.lines().count().max(1);
    slice_lines(text, start_line, total_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn analyze(text: &str, config: &ChunkConfig) -> ContentAnalysis {
        parser::analyze(text, config)
    }

    #[test]
    fn preamble_plus_two_sections() {
        let text = "Intro text before any header.\n\n# Title\n\nBody A.\n\n## Sub\n\nBody B.\n";
        let config = ChunkConfig {
            min_chunk_size: 1,
            ..Default::default()
        }
        .new()
        .unwrap();
        let analysis = analyze(text, &config);
        let chunks = apply(&analysis, &config);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata.header_path.as_deref(), Some("/__preamble__"));
        assert_eq!(chunks[1].metadata.header_path.as_deref(), Some("/Title"));
        assert_eq!(chunks[1].metadata.header_level, Some(1));
        assert_eq!(chunks[2].metadata.header_path.as_deref(), Some("/Title/Sub"));
        assert_eq!(chunks[2].metadata.header_level, Some(2));
        assert!(chunks[2].metadata.section_tags.is_empty());
    }

    #[test]
    fn oversize_section_splits_at_sub_headers() {
        let big_body = "x".repeat(200);
        let text = format!(
            "# Title\n\n## First\n\n{big_body}\n\n## Second\n\n{big_body}\n"
        );
        let config = ChunkConfig {
            max_chunk_size: 150,
            min_chunk_size: 1,
            ..Default::default()
        }
        .new()
        .unwrap();
        let analysis = analyze(&text, &config);
        let chunks = apply(&analysis, &config);
        assert!(chunks.iter().all(|c| c.metadata.header_path.as_deref() == Some("/Title")));
        assert!(chunks.len() >= 2);
    }
}
