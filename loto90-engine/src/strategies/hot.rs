use loto90_db::models::{Draw, Stream};

use crate::analysis::{number_frequencies, stream_history};
use super::{Strategy, StrategyKey};

/// Les k numéros les plus fréquents.
pub struct HotStrategy;

impl Strategy for HotStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Hot
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        rank_by_frequency(&sets, k)
    }
}

pub fn rank_by_frequency(sets: &[[u8; 5]], k: usize) -> Vec<u8> {
    let freq = number_frequencies(sets);
    let mut ranked: Vec<(u8, u32)> = freq
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(i, &c)| ((i + 1) as u8, c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(n, _)| n).collect()
}
