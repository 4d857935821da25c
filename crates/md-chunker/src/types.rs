use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A unit of chunked output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The chunk's textual content
    pub content: String,

    /// Start line in the source document, 1-based, inclusive
    pub start_line: usize,

    /// End line in the source document, 1-based, inclusive
    pub end_line: usize,

    /// Structured metadata about this chunk
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: String, start_line: usize, end_line: usize, metadata: ChunkMetadata) -> Self {
        Self {
            content,
            start_line,
            end_line,
            metadata,
        }
    }

    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Refresh the size-dependent metadata fields (`size`, `line_count`,
    /// `has_code`) from the current content. Called after any content
    /// mutation during post-processing.
    pub fn recompute_derived_metadata(&mut self) {
        self.metadata.size = self.content.chars().count();
        self.metadata.line_count = self.line_count();
        self.metadata.has_code = contains_fence_marker(&self.content);
    }
}

fn contains_fence_marker(content: &str) -> bool {
    content.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with("```") || trimmed.starts_with("~~~")
    })
}

/// Metadata attached to a [`Chunk`]. Optional fields serialize only when
/// present, so the wire format matches the spec's "key -> value map" with
/// required and optional keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub content_type: ContentType,
    pub strategy: Strategy,
    pub has_code: bool,
    pub size: usize,
    pub line_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_level: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub section_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_oversize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversize_reason: Option<OversizeReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_chunk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_chunk_reason: Option<SmallChunkReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_size: Option<usize>,
}

impl ChunkMetadata {
    pub fn new(content_type: ContentType, strategy: Strategy) -> Self {
        Self {
            content_type,
            strategy,
            ..Default::default()
        }
    }
}

/// Semantic category of a chunk's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Preamble,
    Code,
    #[default]
    Text,
    Table,
    List,
    Mixed,
    Section,
}

/// The strategy responsible for producing a given chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CodeAware,
    Structural,
    #[default]
    Fallback,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::CodeAware => "code_aware",
            Strategy::Structural => "structural",
            Strategy::Fallback => "fallback",
        }
    }
}

/// Why a chunk was allowed to exceed `max_chunk_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizeReason {
    CodeBlockIntegrity,
    TableIntegrity,
    SectionIntegrity,
}

/// Why a chunk below `min_chunk_size` could not be merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmallChunkReason {
    CannotMerge,
}

/// The fence character used to open a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FenceChar {
    Backtick,
    Tilde,
}

impl FenceChar {
    pub fn as_char(self) -> char {
        match self {
            FenceChar::Backtick => '`',
            FenceChar::Tilde => '~',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '`' => Some(FenceChar::Backtick),
            '~' => Some(FenceChar::Tilde),
            _ => None,
        }
    }
}

/// A fenced code block detected by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FencedBlock {
    pub fence_char: FenceChar,
    pub fence_length: u8,
    pub info_string: Option<String>,
    pub language: Option<String>,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub closed: bool,
}

/// An ATX header detected by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Header {
    pub level: u8,
    pub text: String,
    pub line: usize,
    pub offset: usize,
}

/// A Markdown table detected by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub rows: usize,
    pub columns: usize,
}

/// A list run detected by the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub ordered: bool,
    pub max_depth: u8,
}

/// Output of the structural analyzer: a parsed, line/offset-annotated view
/// of the normalized document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContentAnalysis {
    pub text: String,
    pub total_chars: usize,
    pub total_lines: usize,
    pub headers: Vec<Header>,
    pub fenced_blocks: Vec<FencedBlock>,
    pub tables: Vec<TableBlock>,
    pub lists: Vec<ListBlock>,
    pub code_ratio: f64,
    pub header_count: usize,
    pub max_header_depth: u8,
    pub table_count: usize,
    pub list_count: usize,
    pub complexity_score: f64,
    pub preamble_range: Option<(usize, usize)>,
}

impl ContentAnalysis {
    /// Atomic (never-split) byte-offset ranges: fenced blocks and tables,
    /// sorted and non-overlapping (fences always win over a table marker
    /// accidentally detected inside one, since table scanning skips fenced
    /// regions in the parser).
    pub fn atomic_ranges(&self) -> Vec<AtomicRange> {
        let mut ranges: Vec<AtomicRange> = Vec::new();

        for fb in &self.fenced_blocks {
            ranges.push(AtomicRange {
                start_offset: fb.start_offset,
                end_offset: fb.end_offset,
                start_line: fb.start_line,
                end_line: fb.end_line,
                kind: AtomicKind::Code,
            });
        }

        for tb in &self.tables {
            let (start_offset, end_offset) = line_range_to_offsets(&self.text, tb.start_line, tb.end_line);
            ranges.push(AtomicRange {
                start_offset,
                end_offset,
                start_line: tb.start_line,
                end_line: tb.end_line,
                kind: AtomicKind::Table,
            });
        }

        ranges.sort_by_key(|r| r.start_offset);
        ranges
    }
}

/// Converts an inclusive 1-based line range into a byte-offset range over
/// `text`, used for table atomic ranges (tables don't carry offsets
/// directly, unlike fenced blocks).
pub fn line_range_to_offsets(text: &str, start_line: usize, end_line: usize) -> (usize, usize) {
    let mut offset = 0usize;
    let mut line_no = 1usize;
    let mut start_offset = 0usize;
    let mut end_offset = text.len();
    for line in text.split_inclusive('\n') {
        if line_no == start_line {
            start_offset = offset;
        }
        offset += line.len();
        if line_no == end_line {
            end_offset = offset;
            break;
        }
        line_no += 1;
    }
    (start_offset, end_offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicKind {
    Code,
    Table,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicRange {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: AtomicKind,
}

/// Final result of a `chunk(..)` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<Chunk>,
    pub strategy_used: String,
    pub processing_time: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_chars: usize,
    pub total_lines: usize,
}

/// Arbitrary key/value view used by the config's map-constructor; kept
/// separate from `ChunkConfig` itself so the typed struct stays the
/// primary API and this is purely a translation layer.
pub type ConfigMap = HashMap<String, serde_json::Value>;
