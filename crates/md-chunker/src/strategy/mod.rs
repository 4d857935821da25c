//! Strategy selection and dispatch (spec §4.2). A closed set of three
//! strategies, chosen by priority + capability rather than trait objects:
//! the dispatch is a single `match`, mirroring the fixed, small strategy
//! set this system is built around.

mod atomic_pack;
mod code_aware;
mod fallback;
mod splitting;
mod structural;

use crate::config::{ChunkConfig, StrategyOverride};
use crate::types::{Chunk, ContentAnalysis, Strategy};
use log::warn;

/// Choose a strategy for `analysis` given `config`. An explicit
/// `strategy_override` always wins. Otherwise: code-aware if the document
/// has fenced code, a code-heavy ratio, or any table; structural if it has
/// enough headers with real depth; fallback always qualifies as the
/// last resort.
pub(crate) fn select(analysis: &ContentAnalysis, config: &ChunkConfig) -> Strategy {
    if let Some(order) = config.strategy_override {
        return match order {
            StrategyOverride::CodeAware => Strategy::CodeAware,
            StrategyOverride::Structural => Strategy::Structural,
            StrategyOverride::Fallback => Strategy::Fallback,
        };
    }

    let code_aware_eligible =
        !analysis.fenced_blocks.is_empty() || analysis.code_ratio >= config.code_threshold || analysis.table_count >= 1;
    if code_aware_eligible {
        return Strategy::CodeAware;
    }

    let structural_eligible = analysis.header_count >= config.structure_threshold && analysis.max_header_depth >= 1;
    if structural_eligible {
        return Strategy::Structural;
    }

    Strategy::Fallback
}

/// Select a strategy and run it, falling back to the fallback strategy if
/// the chosen one produces no chunks for non-empty input -- the dispatch
/// layer's own safety net, distinct from the fallback strategy's own
/// always-succeeds guarantee for genuinely unstructured input.
pub(crate) fn execute(analysis: &ContentAnalysis, config: &ChunkConfig) -> (Strategy, Vec<Chunk>) {
    let chosen = select(analysis, config);
    let chunks = apply(chosen, analysis, config);

    if chunks.is_empty() && !analysis.text.trim().is_empty() && chosen != Strategy::Fallback {
        warn!(
            "strategy {:?} produced no chunks for non-empty input; falling back",
            chosen
        );
        return (Strategy::Fallback, fallback::apply(analysis, config));
    }

    (chosen, chunks)
}

fn apply(strategy: Strategy, analysis: &ContentAnalysis, config: &ChunkConfig) -> Vec<Chunk> {
    match strategy {
        Strategy::CodeAware => code_aware::apply(analysis, config),
        Strategy::Structural => structural::apply(analysis, config),
        Strategy::Fallback => fallback::apply(analysis, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn override_short_circuits_selection() {
        let config = ChunkConfig {
            strategy_override: Some(StrategyOverride::Fallback),
            ..Default::default()
        }
        .new()
        .unwrap();
        let analysis = parser::analyze("# A\n## B\n## C\n### D\n", &config);
        assert_eq!(select(&analysis, &config), Strategy::Fallback);
    }

    #[test]
    fn fenced_code_selects_code_aware() {
        let config = ChunkConfig::default().new().unwrap();
        let analysis = parser::analyze("Text.\n\n```rust\nfn f() {}\n```\n", &config);
        assert_eq!(select(&analysis, &config), Strategy::CodeAware);
    }

    #[test]
    fn enough_headers_selects_structural() {
        let config = ChunkConfig::default().new().unwrap();
        let analysis = parser::analyze("# A\n\ntext\n\n## B\n\ntext\n\n## C\n\ntext\n", &config);
        assert_eq!(select(&analysis, &config), Strategy::Structural);
    }

    #[test]
    fn plain_prose_selects_fallback() {
        let config = ChunkConfig::default().new().unwrap();
        let analysis = parser::analyze("Just a little bit of plain prose with no structure.\n", &config);
        assert_eq!(select(&analysis, &config), Strategy::Fallback);
    }

    #[test]
    fn execute_falls_back_on_empty_result_from_non_empty_input() {
        // structure_threshold of 0 with no headers at all should never be
        // reachable in select(), but execute()'s safety net is exercised
        // via a pathological config: max_chunk_size so small atomic_pack
        // still must emit something, so this really just confirms that the
        // happy path does not spuriously reroute to fallback.
        let config = ChunkConfig::default().new().unwrap();
        let analysis = parser::analyze("Some text.\n", &config);
        let (strategy, chunks) = execute(&analysis, &config);
        assert_eq!(strategy, Strategy::Fallback);
        assert!(!chunks.is_empty());
    }
}
