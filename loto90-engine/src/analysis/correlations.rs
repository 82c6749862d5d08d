use std::collections::HashMap;

use super::number_frequencies;

/// Paire de numéros avec son lift : co-occurrence rapportée au produit
/// des fréquences marginales. lift > 1 indique une association positive.
#[derive(Debug, Clone)]
pub struct PairLift {
    pub a: u8,
    pub b: u8,
    pub count: u32,
    pub lift: f64,
}

#[derive(Debug, Clone)]
pub struct CorrelationStats {
    /// Paires retenues (count ≥ 3 et lift > 1.2), co-occurrences
    /// décroissantes.
    pub top_pairs: Vec<PairLift>,
    /// Triplets les plus fréquents, pour le reporting seulement.
    pub top_triples: Vec<([u8; 3], u32)>,
}

const MIN_PAIR_COUNT: u32 = 3;
const MIN_LIFT: f64 = 1.2;

pub fn correlation_analysis(sets: &[[u8; 5]]) -> CorrelationStats {
    let n = sets.len();
    if n == 0 {
        return CorrelationStats {
            top_pairs: Vec::new(),
            top_triples: Vec::new(),
        };
    }

    let freq = number_frequencies(sets);
    let mut pair_counts: HashMap<(u8, u8), u32> = HashMap::new();
    let mut triple_counts: HashMap<[u8; 3], u32> = HashMap::new();

    for set in sets {
        let mut sorted = *set;
        sorted.sort_unstable();
        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                *pair_counts.entry((sorted[i], sorted[j])).or_insert(0) += 1;
                for k in (j + 1)..sorted.len() {
                    *triple_counts
                        .entry([sorted[i], sorted[j], sorted[k]])
                        .or_insert(0) += 1;
                }
            }
        }
    }

    let mut top_pairs: Vec<PairLift> = pair_counts
        .into_iter()
        .filter_map(|((a, b), count)| {
            let fa = freq[(a - 1) as usize];
            let fb = freq[(b - 1) as usize];
            if fa == 0 || fb == 0 {
                return None;
            }
            let lift = (count as f64 * n as f64) / (fa as f64 * fb as f64);
            if count >= MIN_PAIR_COUNT && lift > MIN_LIFT {
                Some(PairLift { a, b, count, lift })
            } else {
                None
            }
        })
        .collect();
    top_pairs.sort_by(|x, y| {
        y.count
            .cmp(&x.count)
            .then(
                y.lift
                    .partial_cmp(&x.lift)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then((x.a, x.b).cmp(&(y.a, y.b)))
    });

    let mut top_triples: Vec<([u8; 3], u32)> = triple_counts
        .into_iter()
        .filter(|&(_, count)| count >= MIN_PAIR_COUNT)
        .collect();
    top_triples.sort_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));
    top_triples.truncate(10);

    CorrelationStats {
        top_pairs,
        top_triples,
    }
}

/// Lift d'une paire donnée parmi les paires retenues, si présente.
pub fn pair_lift(stats: &CorrelationStats, a: u8, b: u8) -> Option<f64> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    stats
        .top_pairs
        .iter()
        .find(|p| p.a == lo && p.b == hi)
        .map(|p| p.lift)
}
