use loto90_db::models::{Draw, Stream};

use crate::analysis::{decades::decade_of, number_frequencies, stream_history};
use super::{Strategy, StrategyKey};

/// Ordre de visite des dizaines : les dizaines centrales d'abord.
const DECADE_ORDER: [usize; 9] = [2, 3, 4, 5, 1, 6, 7, 0, 8];

/// Prend le numéro le plus fréquent de chaque dizaine, en visitant les
/// dizaines dans l'ordre fixe, puis repasse tant qu'il reste des
/// candidats et que k n'est pas atteint.
pub struct BalancedStrategy;

impl Strategy for BalancedStrategy {
    fn key(&self) -> StrategyKey {
        StrategyKey::Balanced
    }

    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8> {
        let sets = stream_history(draws, stream);
        if sets.is_empty() {
            return Vec::new();
        }
        let freq = number_frequencies(&sets);

        // Par dizaine : numéros vus, fréquence décroissante puis numéro croissant.
        let mut per_decade: [Vec<u8>; 9] = Default::default();
        let mut seen: Vec<(u8, u32)> = freq
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| ((i + 1) as u8, c))
            .collect();
        seen.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (n, _) in seen {
            per_decade[decade_of(n)].push(n);
        }

        let mut result = Vec::with_capacity(k);
        let mut depth = 0;
        loop {
            let mut advanced = false;
            for &d in &DECADE_ORDER {
                if result.len() >= k {
                    return result;
                }
                if let Some(&n) = per_decade[d].get(depth) {
                    advanced = true;
                    result.push(n);
                }
            }
            if !advanced {
                return result;
            }
            depth += 1;
        }
    }
}
