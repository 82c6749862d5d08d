use loto90_db::models::{Draw, Stream};

use crate::analysis::{cycles::cycle_analysis, stream_history};
use super::{Strategy, StrategyKey};

/// Numéros en retard sur leur cycle moyen. Seuls les numéros avec au
/// moins 3 cycles complets sont candidats.
pub struct DueStrategy;

const MIN_CYCLES: u32 = 3;

impl Strategy for DueStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Due
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        if sets.is_empty() {
            return Vec::new();
        }
        let mut candidates: Vec<(u8, f64)> = cycle_analysis(&sets)
            .into_iter()
            .filter(|s| s.cycle_count >= MIN_CYCLES)
            .map(|s| (s.number, s.due_score))
            .collect();
        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        candidates.into_iter().take(k).map(|(n, _)| n).collect()
    }
}
