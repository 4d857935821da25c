//! # Markdown Chunker
//!
//! Structure-aware Markdown chunking for retrieval-augmented generation
//! pipelines.
//!
//! ## Philosophy
//!
//! The chunker splits a Markdown document into retrieval-sized pieces that:
//! - Never split a fenced code block or table across a chunk boundary
//! - Carry their header hierarchy as metadata (`header_path`)
//! - Stay within a configurable size budget, escalating only when an
//!   atomic block genuinely cannot fit
//! - Optionally carry overlap context to help downstream retrieval avoid
//!   hard cuts mid-thought
//!
//! ## Architecture
//!
//! ```text
//! Markdown text
//!     │
//!     ├──> Parser (normalize line endings, scan fences/headers/tables/lists)
//!     │
//!     ├──> Strategy selection (code-aware / structural / fallback)
//!     │    └─> Chunk generation honoring atomic ranges
//!     │
//!     ├──> Post-processing
//!     │    ├─> Merge header-only chunks into their body
//!     │    ├─> Merge undersized chunks where safe
//!     │    ├─> Attach overlap context
//!     │    └─> Enrich derived metadata
//!     │
//!     └──> Validation → ChunkingResult { chunks, warnings, ... }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use md_chunker::chunk_text;
//!
//! let text = "# Title\n\nSome introductory text.\n\n## Section\n\nMore detail here.\n";
//! let result = chunk_text(text).unwrap();
//! for chunk in &result.chunks {
//!     println!("{:?}: {} chars", chunk.metadata.header_path, chunk.size());
//! }
//! ```

mod chunker;
mod config;
mod error;
mod parser;
mod postprocess;
mod strategy;
mod types;
mod validator;

pub use chunker::{chunk, chunk_file, chunk_text};
pub use config::{ChunkConfig, StrategyOverride};
pub use error::{ChunkingError, Result};
pub use types::{
    Chunk, ChunkMetadata, ChunkingResult, ConfigMap, ContentAnalysis, ContentType, FenceChar,
    FencedBlock, Header, ListBlock, OversizeReason, SmallChunkReason, Strategy, TableBlock,
};
