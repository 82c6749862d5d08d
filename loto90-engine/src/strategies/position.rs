use loto90_db::models::{Draw, Stream, PICK_COUNT};

use crate::analysis::{positions::position_analysis, stream_history};
use super::hot::rank_by_frequency;
use super::{Strategy, StrategyKey};

/// Le numéro le plus fréquent de chaque position 1..5 (tirage trié),
/// en sautant les numéros déjà retenus ; complété par les numéros
/// chauds si moins de 5.
pub struct PositionStrategy;

impl Strategy for PositionStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Position
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        if sets.is_empty() {
            return Vec::new();
        }
        let stats = position_analysis(&sets);
        let mut chosen: Vec<u8> = Vec::with_capacity(PICK_COUNT);

        for pos in 0..PICK_COUNT {
            for (n, _) in stats.top(pos, PICK_COUNT) {
                if !chosen.contains(&n) {
                    chosen.push(n);
                    break;
                }
            }
        }

        if chosen.len() < PICK_COUNT {
            for n in rank_by_frequency(&sets, PICK_COUNT * 2) {
                if chosen.len() >= PICK_COUNT {
                    break;
                }
                if !chosen.contains(&n) {
                    chosen.push(n);
                }
            }
        }

        chosen.truncate(k.min(PICK_COUNT));
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_draws;

    #[test]
    fn test_dominant_positions() {
        // Tirages identiques : la stratégie restitue les 5 positions.
        let mut draws = make_test_draws(20);
        for d in &mut draws {
            d.winning = [4, 18, 33, 59, 77];
        }
        let ranked = PositionStrategy.rank(&draws, 15, Stream::Winning);
        assert_eq!(ranked, vec![4, 18, 33, 59, 77]);
    }

    #[test]
    fn test_at_most_five() {
        let draws = make_test_draws(50);
        assert!(PositionStrategy.rank(&draws, 15, Stream::Winning).len() <= 5);
    }

    #[test]
    fn test_empty() {
        assert!(PositionStrategy.rank(&[], 15, Stream::Winning).is_empty());
    }
}
