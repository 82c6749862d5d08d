use std::sync::Arc;

use loto90_db::models::{Draw, Stream};

use crate::ml::MlSource;
use super::{Strategy, StrategyKey};

/// Adapte la source ML externe au pool de stratégies, sous la clé de
/// poids `lstm`.
pub struct MlStrategy {
    source: Arc<dyn MlSource>,
}

impl MlStrategy {
    pub fn new(source: Arc<dyn MlSource>) -> Self {
        Self { source }
    }
}

impl Strategy for MlStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Lstm
    }

    fn rank(&self, draws: &[Draw], k: usize, _stream: Stream) -> Vec<u8> {
        if draws.is_empty() {
            return Vec::new();
        }
        let mut seen = Vec::with_capacity(k);
        for n in self.source.rank(draws, k) {
            if (1..=90).contains(&n) && !seen.contains(&n) {
                seen.push(n);
            }
        }
        seen
    }
}
