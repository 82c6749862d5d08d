use loto90_db::models::{Draw, Stream, POOL_SIZE};

use crate::analysis::{
    correlations::correlation_analysis, followers::follower_analysis, stream_history,
};
use super::{Strategy, StrategyKey};

/// Score composite autour du dernier tirage : associations par paires
/// (lift) et suiveurs observés.
pub struct StatisticalStrategy;

impl Strategy for StatisticalStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Statistical
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        let last = match sets.last() {
            Some(last) => *last,
            None => return Vec::new(),
        };
        let correlations = correlation_analysis(&sets);
        let followers = follower_analysis(&sets);

        let mut scores = [0.0f64; POOL_SIZE];

        // Σ (lift − 1) · 2 sur les paires retenues contenant un numéro
        // du dernier tirage.
        for pair in &correlations.top_pairs {
            if last.contains(&pair.a) && !last.contains(&pair.b) {
                scores[(pair.b - 1) as usize] += (pair.lift - 1.0) * 2.0;
            }
            if last.contains(&pair.b) && !last.contains(&pair.a) {
                scores[(pair.a - 1) as usize] += (pair.lift - 1.0) * 2.0;
            }
        }

        // Σ probabilité · 5 sur les suiveurs des ancres du dernier tirage.
        for anchor in last {
            if let Some(list) = followers.get(&anchor) {
                for f in list {
                    scores[(f.number - 1) as usize] += f.probability * 5.0;
                }
            }
        }

        let mut ranked: Vec<(u8, f64)> = scores
            .iter()
            .enumerate()
            .filter(|(_, &s)| s > 0.0)
            .map(|(i, &s)| ((i + 1) as u8, s))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.into_iter().take(k).map(|(n, _)| n).collect()
    }
}
