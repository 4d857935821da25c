use crate::error::{ChunkingError, Result};
use crate::types::ConfigMap;
use serde::{Deserialize, Serialize};

/// Configuration for chunking behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkConfig {
    /// Upper bound on chunk character length; may be exceeded only via
    /// `allow_oversize` for atomic content.
    pub max_chunk_size: usize,

    /// Target lower bound; smaller chunks are merge candidates.
    pub min_chunk_size: usize,

    /// Context window stored in metadata. 0 disables overlap.
    pub overlap_size: usize,

    /// If true, code blocks and tables are never split.
    pub preserve_atomic_blocks: bool,

    /// If true, content before the first header is placed into a
    /// dedicated preamble chunk.
    pub extract_preamble: bool,

    /// Fraction of the document that is code at which the code-aware
    /// strategy activates.
    pub code_threshold: f64,

    /// Minimum count of headers for the structural strategy to be
    /// applicable.
    pub structure_threshold: usize,

    /// Forces a specific strategy, bypassing priority dispatch.
    pub strategy_override: Option<StrategyOverride>,

    /// Strip trailing Obsidian-style block identifiers (`^abc123`) at end
    /// of line during parsing. Default disabled.
    pub strip_block_identifiers: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 4096,
            min_chunk_size: 512,
            overlap_size: 200,
            preserve_atomic_blocks: true,
            extract_preamble: true,
            code_threshold: 0.3,
            structure_threshold: 3,
            strategy_override: None,
            strip_block_identifiers: false,
        }
    }
}

impl ChunkConfig {
    /// Construct a config, applying the silent auto-corrections the spec
    /// calls for and hard-failing on the invariants it does not permit to
    /// be auto-corrected.
    pub fn new(mut self) -> Result<Self> {
        if self.max_chunk_size == 0 {
            return Err(ChunkingError::invalid_config("max_chunk_size must be > 0"));
        }

        if self.min_chunk_size >= self.max_chunk_size {
            self.min_chunk_size = self.max_chunk_size / 2;
        }

        self.validate()?;
        Ok(self)
    }

    /// Pure check of the invariants that must hold after construction;
    /// does not mutate.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ChunkingError::invalid_config("max_chunk_size must be > 0"));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(ChunkingError::invalid_config(format!(
                "overlap_size ({}) must be < max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.code_threshold) {
            return Err(ChunkingError::invalid_config(format!(
                "code_threshold ({}) must be within [0, 1]",
                self.code_threshold
            )));
        }
        Ok(())
    }

    /// Build a `ChunkConfig` from a key -> value map, as a surrounding
    /// layer (e.g. a REST adapter or CLI) might pass through user input.
    /// Unknown keys raise a validation error; `enable_overlap` is accepted
    /// as a deprecated alias for `overlap_size > 0`.
    pub fn from_map(map: &ConfigMap) -> Result<(Self, Vec<String>)> {
        let mut config = ChunkConfig::default();
        let mut warnings = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "max_chunk_size" => config.max_chunk_size = expect_usize(key, value)?,
                "min_chunk_size" => config.min_chunk_size = expect_usize(key, value)?,
                "overlap_size" => config.overlap_size = expect_usize(key, value)?,
                "preserve_atomic_blocks" => config.preserve_atomic_blocks = expect_bool(key, value)?,
                "extract_preamble" => config.extract_preamble = expect_bool(key, value)?,
                "code_threshold" => config.code_threshold = expect_f64(key, value)?,
                "structure_threshold" => config.structure_threshold = expect_usize(key, value)?,
                "strip_block_identifiers" => config.strip_block_identifiers = expect_bool(key, value)?,
                "strategy_override" => {
                    let s = value.as_str().ok_or_else(|| {
                        ChunkingError::invalid_config("strategy_override must be a string")
                    })?;
                    config.strategy_override = Some(StrategyOverride::parse(s)?);
                }
                "enable_overlap" => {
                    warnings.push(
                        "enable_overlap is deprecated; use overlap_size > 0 instead".to_string(),
                    );
                    if !expect_bool(key, value)? {
                        config.overlap_size = 0;
                    }
                }
                other => {
                    return Err(ChunkingError::invalid_config(format!(
                        "unknown config key: {other}"
                    )))
                }
            }
        }

        let config = config.new()?;
        Ok((config, warnings))
    }
}

fn expect_usize(key: &str, value: &serde_json::Value) -> Result<usize> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| ChunkingError::invalid_config(format!("{key} must be a non-negative integer")))
}

fn expect_bool(key: &str, value: &serde_json::Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| ChunkingError::invalid_config(format!("{key} must be a boolean")))
}

fn expect_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| ChunkingError::invalid_config(format!("{key} must be a number")))
}

/// Forces a specific strategy, bypassing the priority+capability dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyOverride {
    CodeAware,
    Structural,
    Fallback,
}

impl StrategyOverride {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "code_aware" => Ok(StrategyOverride::CodeAware),
            "structural" => Ok(StrategyOverride::Structural),
            "fallback" => Ok(StrategyOverride::Fallback),
            other => Err(ChunkingError::not_found(format!(
                "unknown strategy_override: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChunkConfig::default().new().is_ok());
    }

    #[test]
    fn min_chunk_size_auto_corrects() {
        let config = ChunkConfig {
            min_chunk_size: 9000,
            max_chunk_size: 4096,
            ..Default::default()
        }
        .new()
        .unwrap();
        assert_eq!(config.min_chunk_size, 2048);
    }

    #[test]
    fn zero_max_chunk_size_errors() {
        let config = ChunkConfig {
            max_chunk_size: 0,
            ..Default::default()
        };
        assert!(config.new().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_max() {
        let config = ChunkConfig {
            max_chunk_size: 100,
            overlap_size: 100,
            ..Default::default()
        };
        assert!(config.new().is_err());
    }

    #[test]
    fn code_threshold_out_of_range_errors() {
        let config = ChunkConfig {
            code_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.new().is_err());
    }

    #[test]
    fn from_map_rejects_unknown_keys() {
        let mut map = ConfigMap::new();
        map.insert("bogus_key".to_string(), serde_json::json!(true));
        assert!(ChunkConfig::from_map(&map).is_err());
    }

    #[test]
    fn from_map_accepts_known_keys() {
        let mut map = ConfigMap::new();
        map.insert("max_chunk_size".to_string(), serde_json::json!(2048));
        map.insert("strategy_override".to_string(), serde_json::json!("fallback"));
        let (config, warnings) = ChunkConfig::from_map(&map).unwrap();
        assert_eq!(config.max_chunk_size, 2048);
        assert_eq!(config.strategy_override, Some(StrategyOverride::Fallback));
        assert!(warnings.is_empty());
    }

    #[test]
    fn from_map_legacy_enable_overlap_alias() {
        let mut map = ConfigMap::new();
        map.insert("enable_overlap".to_string(), serde_json::json!(false));
        let (config, warnings) = ChunkConfig::from_map(&map).unwrap();
        assert_eq!(config.overlap_size, 0);
        assert_eq!(warnings.len(), 1);
    }
}
