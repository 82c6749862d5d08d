use loto90_db::models::{Draw, Stream};

use crate::analysis::{correlations::correlation_analysis, stream_history};
use super::{Strategy, StrategyKey};

/// Parcourt les meilleures paires par lift et retient leurs deux
/// membres jusqu'à obtenir k numéros.
pub struct CorrelationStrategy;

impl Strategy for CorrelationStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Correlation
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        let stats = correlation_analysis(&sets);

        let mut result = Vec::with_capacity(k);
        for pair in &stats.top_pairs {
            for n in [pair.a, pair.b] {
                if result.len() >= k {
                    return result;
                }
                if !result.contains(&n) {
                    result.push(n);
                }
            }
        }
        result
    }
}
