//! Top-level chunking entry point: the pure pipeline of
//! parse -> select & apply strategy -> post-process -> validate.

use crate::config::ChunkConfig;
use crate::error::Result;
use crate::types::ChunkingResult;
use crate::{parser, postprocess, strategy};
use std::path::Path;
use std::time::Instant;

/// Chunk `text` under `config`, running the full pipeline and returning a
/// [`ChunkingResult`] with timing and any soft warnings attached.
pub fn chunk(text: &str, config: &ChunkConfig) -> Result<ChunkingResult> {
    let started = Instant::now();

    let analysis = parser::analyze(text, config);
    let (chosen_strategy, raw_chunks) = strategy::execute(&analysis, config);
    let chunks = postprocess::run(raw_chunks, config);

    let warnings = crate::validator::validate(&chunks, analysis.total_chars, analysis.total_lines, config.max_chunk_size)?;

    Ok(ChunkingResult {
        chunks,
        strategy_used: chosen_strategy.as_str().to_string(),
        processing_time: started.elapsed().as_secs_f64(),
        errors: Vec::new(),
        warnings,
        total_chars: analysis.total_chars,
        total_lines: analysis.total_lines,
    })
}

/// Chunk `text` with default configuration.
pub fn chunk_text(text: &str) -> Result<ChunkingResult> {
    let config = ChunkConfig::default().new()?;
    chunk(text, &config)
}

/// Read a file and chunk its contents.
pub fn chunk_file(path: impl AsRef<Path>, config: &ChunkConfig) -> Result<ChunkingResult> {
    let content = std::fs::read_to_string(path)?;
    chunk(&content, config)
}
