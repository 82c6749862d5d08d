use loto90_db::models::{Draw, Stream};

use super::due::DueStrategy;
use super::hot::HotStrategy;
use super::Strategy;

/// Entrelace numéros chauds et numéros en retard. Sert la liste des
/// grilles alternatives ; ne porte aucun poids dans l'ensemble.
pub fn rank_mixed(draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
    let hot = HotStrategy.rank(draws, k, stream);
    let due = DueStrategy.rank(draws, k, stream);

    let mut result = Vec::with_capacity(k);
    let mut hot_it = hot.into_iter();
    let mut due_it = due.into_iter();
    loop {
        let mut advanced = false;
        for next in [hot_it.next(), due_it.next()] {
            if let Some(n) = next {
                advanced = true;
                if result.len() < k && !result.contains(&n) {
                    result.push(n);
                }
            }
        }
        if !advanced || result.len() >= k {
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_draws;

    #[test]
    fn test_interleaves_hot_first() {
        let mut draws = make_test_draws(60);
        for d in &mut draws {
            if !d.winning.contains(&7) {
                d.winning[0] = 7;
            }
        }
        let mixed = rank_mixed(&draws, 10, Stream::Winning);
        assert_eq!(mixed.first(), Some(&7));
        assert!(mixed.len() <= 10);
    }

    #[test]
    fn test_distinct() {
        let draws = make_test_draws(60);
        let mixed = rank_mixed(&draws, 15, Stream::Winning);
        let mut dedup = mixed.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), mixed.len());
    }

    #[test]
    fn test_empty() {
        assert!(rank_mixed(&[], 10, Stream::Winning).is_empty());
    }
}
