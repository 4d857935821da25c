//! Post-processing output validation (spec §4.8). Soft violations are
//! recorded as warnings on the result; hard violations abort the call with
//! an error, since they indicate silent data loss or a broken invariant
//! rather than a quality trade-off.

use crate::error::{ChunkingError, Result};
use crate::types::Chunk;

const CONTENT_PRESERVATION_THRESHOLD: f64 = 0.95;
const SOFT_GAP_LINE_THRESHOLD: usize = 10;

pub(crate) fn validate(chunks: &[Chunk], total_chars: usize, total_lines: usize, max_chunk_size: usize) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    check_monotonic_order(chunks)?;
    check_no_empty_chunks(chunks)?;
    check_header_paths(chunks)?;
    check_metadata_consistency(chunks)?;
    warnings.extend(check_content_preservation(chunks, total_chars, total_lines)?);
    warnings.extend(check_size_bounds(chunks, max_chunk_size));

    Ok(warnings)
}

fn check_monotonic_order(chunks: &[Chunk]) -> Result<()> {
    for window in chunks.windows(2) {
        if window[1].start_line < window[0].start_line {
            return Err(ChunkingError::hard_invariant(format!(
                "chunk order is not monotonic: chunk starting at line {} follows one starting at line {}",
                window[1].start_line, window[0].start_line
            )));
        }
        if window[1].end_line < window[0].end_line {
            return Err(ChunkingError::hard_invariant(format!(
                "chunk order is not monotonic: chunk ending at line {} follows one ending at line {}",
                window[1].end_line, window[0].end_line
            )));
        }
    }
    Ok(())
}

fn check_no_empty_chunks(chunks: &[Chunk]) -> Result<()> {
    for (idx, chunk) in chunks.iter().enumerate() {
        if chunk.content.trim().is_empty() {
            return Err(ChunkingError::hard_invariant(format!("chunk {idx} has empty content")));
        }
    }
    Ok(())
}

fn check_header_paths(chunks: &[Chunk]) -> Result<()> {
    for (idx, chunk) in chunks.iter().enumerate() {
        if let Some(path) = &chunk.metadata.header_path {
            if !path.starts_with('/') {
                return Err(ChunkingError::hard_invariant(format!(
                    "chunk {idx} has malformed header_path {path:?}: must start with '/'"
                )));
            }
            if path.contains("//") {
                return Err(ChunkingError::hard_invariant(format!(
                    "chunk {idx} has malformed header_path {path:?}: contains an empty segment"
                )));
            }
        }
    }
    Ok(())
}

fn check_metadata_consistency(chunks: &[Chunk]) -> Result<()> {
    for (idx, chunk) in chunks.iter().enumerate() {
        if chunk.metadata.chunk_index != idx {
            return Err(ChunkingError::hard_invariant(format!(
                "chunk {idx} has chunk_index {} (expected {idx})",
                chunk.metadata.chunk_index
            )));
        }
        if chunk.metadata.size != chunk.content.chars().count() {
            return Err(ChunkingError::hard_invariant(format!(
                "chunk {idx} metadata.size ({}) does not match actual content size ({})",
                chunk.metadata.size,
                chunk.content.chars().count()
            )));
        }
    }
    Ok(())
}

/// Soft check: total chunked content should cover at least 95% of the
/// source document's characters. Gaps larger than ~10 lines of equivalent
/// content are treated as hard content loss instead, since the whitespace
/// and boundary markers dropped during splitting never account for that
/// much missing text.
fn check_content_preservation(chunks: &[Chunk], total_chars: usize, total_lines: usize) -> Result<Vec<String>> {
    if total_chars == 0 {
        return Ok(Vec::new());
    }

    let covered: usize = chunks.iter().map(|c| c.content.chars().count()).sum();
    let ratio = covered as f64 / total_chars as f64;

    if ratio >= CONTENT_PRESERVATION_THRESHOLD {
        return Ok(Vec::new());
    }

    let missing_chars = total_chars.saturating_sub(covered);
    let avg_chars_per_line = (total_chars as f64 / total_lines.max(1) as f64).max(1.0);
    let missing_lines_equivalent = (missing_chars as f64 / avg_chars_per_line) as usize;

    if missing_lines_equivalent > SOFT_GAP_LINE_THRESHOLD {
        return Err(ChunkingError::content_loss(format!(
            "only {:.1}% of source content preserved across chunks (~{missing_lines_equivalent} lines missing)",
            ratio * 100.0
        )));
    }

    Ok(vec![format!(
        "content preservation ratio {:.3} is below the {:.2} target",
        ratio, CONTENT_PRESERVATION_THRESHOLD
    )])
}

/// Soft check: chunks over `max_chunk_size` are fine only when tagged
/// `allow_oversize`; anything else over budget is a warning, not a hard
/// failure, since downstream consumers can still choose to accept it.
fn check_size_bounds(chunks: &[Chunk], max_chunk_size: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        let size = chunk.content.chars().count();
        if size > max_chunk_size && chunk.metadata.allow_oversize != Some(true) {
            warnings.push(format!(
                "chunk {idx} exceeds max_chunk_size ({size} > {max_chunk_size}) without allow_oversize"
            ));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, ContentType, Strategy};

    fn chunk(content: &str, start: usize, end: usize, index: usize) -> Chunk {
        let mut metadata = ChunkMetadata::new(ContentType::Text, Strategy::Fallback);
        metadata.chunk_index = index;
        metadata.size = content.chars().count();
        Chunk::new(content.to_string(), start, end, metadata)
    }

    #[test]
    fn accepts_well_formed_chunks() {
        let chunks = vec![chunk("hello world", 1, 1, 0)];
        assert!(validate(&chunks, 11, 1, 4096).is_ok());
    }

    #[test]
    fn rejects_non_monotonic_order() {
        let chunks = vec![chunk("a", 5, 5, 0), chunk("b", 2, 2, 1)];
        assert!(validate(&chunks, 2, 5, 4096).is_err());
    }

    #[test]
    fn rejects_non_monotonic_end_line_with_equal_start() {
        let chunks = vec![chunk("a", 1, 10, 0), chunk("b", 1, 5, 1)];
        assert!(validate(&chunks, 2, 10, 4096).is_err());
    }

    #[test]
    fn rejects_empty_chunk() {
        let chunks = vec![chunk("   ", 1, 1, 0)];
        assert!(validate(&chunks, 3, 1, 4096).is_err());
    }

    #[test]
    fn rejects_malformed_header_path() {
        let mut c = chunk("text", 1, 1, 0);
        c.metadata.header_path = Some("no-leading-slash".to_string());
        assert!(validate(&[c], 4, 1, 4096).is_err());
    }

    #[test]
    fn warns_on_small_content_loss() {
        let chunks = vec![chunk("short", 1, 1, 0)];
        let warnings = validate(&chunks, 1000, 50, 4096).unwrap();
        assert!(!warnings.is_empty());
    }

    #[test]
    fn errors_on_severe_content_loss() {
        let chunks = vec![chunk("x", 1, 1, 0)];
        let result = validate(&chunks, 100_000, 5000, 4096);
        assert!(result.is_err());
    }
}
