use loto90_db::models::{Draw, Stream, POOL_SIZE};

use crate::analysis::{finales::finale_analysis, number_frequencies, stream_history};
use super::{Strategy, StrategyKey};

/// Retient les trois meilleures finales (0.6 · dueScore + 0.4 · part)
/// puis classe leurs numéros par fréquence globale.
pub struct FinalesStrategy;

const TOP_FINALES: usize = 3;

impl Strategy for FinalesStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Finales
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        if sets.is_empty() {
            return Vec::new();
        }
        let stats = finale_analysis(&sets);
        let freq = number_frequencies(&sets);

        let mut weighted: Vec<(u8, f64)> = stats
            .iter()
            .map(|s| (s.finale, 0.6 * s.due_score + 0.4 * s.percentage))
            .collect();
        weighted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        let chosen: Vec<u8> = weighted.into_iter().take(TOP_FINALES).map(|(f, _)| f).collect();

        let mut members: Vec<(u8, u32)> = (1..=POOL_SIZE as u8)
            .filter(|n| chosen.contains(&(n % 10)))
            .map(|n| (n, freq[(n - 1) as usize]))
            .collect();
        members.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        members.into_iter().take(k).map(|(n, _)| n).collect()
    }
}
