//! Combinaison pondérée des stratégies en une carte de scores 1..90.
//! Dépend des stratégies et des analyseurs, jamais du cerveau : le
//! cerveau consomme le scoreur, pas l'inverse.

use loto90_db::models::{Draw, Stream, POOL_SIZE};

use crate::analysis::{cycles::cycle_analysis, stream_history};
use crate::strategies::{Strategy, StrategyKey, StrategyWeights};

/// Longueur des listes classées consommées par l'ensemble.
pub const RANK_WINDOW: usize = 15;

const NEIGHBOR_SHARE: f64 = 0.15;
const NEIGHBOR_POOL: usize = 15;
const LONE_WOLF_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct ScoreMap {
    pub scores: [f64; POOL_SIZE],
    /// Votes : combien de stratégies classent le numéro dans leur top-5.
    pub votes: [u32; POOL_SIZE],
}

impl ScoreMap {
    pub fn empty() -> Self {
        Self {
            scores: [0.0; POOL_SIZE],
            votes: [0; POOL_SIZE],
        }
    }

    /// Les k meilleurs numéros, score décroissant puis numéro croissant.
    /// Seuls les scores strictement positifs comptent.
    pub fn top(&self, k: usize) -> Vec<(u8, f64)> {
        let mut ranked: Vec<(u8, f64)> = self
            .scores
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
        ranked.truncate(k);
        ranked
    }

    pub fn score_of(&self, n: u8) -> f64 {
        self.scores[(n - 1) as usize]
    }
}

/// Carte de scores de l'ensemble. Déterministe : mêmes entrées, mêmes
/// sorties, octet pour octet.
pub fn ensemble_scores(
    draws: &[Draw],
    weights: &StrategyWeights,
    stream: Stream,
    strategies: &[Box<dyn Strategy>],
) -> ScoreMap {
    let mut map = ScoreMap::empty();
    if draws.is_empty() {
        return map;
    }

    let sets = stream_history(draws, stream);
    let cycles = cycle_analysis(&sets);

    for strategy in strategies {
        let key = strategy.key();
        let w = weights.get(key);
        let ranked = strategy.rank(draws, RANK_WINDOW, stream);

        for (i, &n) in ranked.iter().enumerate() {
            let idx = (n - 1) as usize;
            let decay = (RANK_WINDOW - i) as f64 / RANK_WINDOW as f64;
            let contribution = match key {
                StrategyKey::Position => w * 2.0,
                StrategyKey::Balanced => {
                    if i < 5 {
                        w * 3.0
                    } else {
                        w * (1.0 + 2.0 * (RANK_WINDOW - i) as f64 / 10.0)
                    }
                }
                StrategyKey::Due => {
                    let due = cycles[idx].due_score.min(150.0) / 150.0;
                    w * decay * due
                }
                _ => w * decay,
            };
            map.scores[idx] += contribution;
            if i < 5 {
                map.votes[idx] += 1;
            }
        }
    }

    redistribute_neighbors(&mut map.scores);
    amplify_consensus(&mut map);

    for s in &mut map.scores {
        if !s.is_finite() || *s < 0.0 {
            *s = 0.0;
        }
    }

    map
}

/// Redistribution tactique : chacun des 15 meilleurs numéros cède 15 %
/// de son score à ses voisins immédiats. Passe unique sur un instantané,
/// bornes 1 et 90 respectées.
fn redistribute_neighbors(scores: &mut [f64; POOL_SIZE]) {
    let snapshot = *scores;
    let mut ranked: Vec<usize> = (0..POOL_SIZE).filter(|&i| snapshot[i] > 0.0).collect();
    ranked.sort_by(|&a, &b| {
        snapshot[b]
            .partial_cmp(&snapshot[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    for &i in ranked.iter().take(NEIGHBOR_POOL) {
        let share = NEIGHBOR_SHARE * snapshot[i];
        if i > 0 {
            scores[i - 1] += share;
        }
        if i + 1 < POOL_SIZE {
            scores[i + 1] += share;
        }
    }
}

/// Amplificateur de consensus : ×1.20 à partir de 5 votes, ×1.10 à
/// partir de 3 ; pénalité de loup solitaire ×0.85 pour un score élevé
/// sans aucun vote.
fn amplify_consensus(map: &mut ScoreMap) {
    for i in 0..POOL_SIZE {
        if map.votes[i] >= 5 {
            map.scores[i] *= 1.20;
        } else if map.votes[i] >= 3 {
            map.scores[i] *= 1.10;
        } else if map.votes[i] == 0 && map.scores[i] > LONE_WOLF_THRESHOLD {
            map.scores[i] *= 0.85;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::make_test_draws;
    use crate::ml::NullMlSource;
    use crate::strategies::all_strategies;

    fn scored(draws: &[Draw]) -> ScoreMap {
        let strategies = all_strategies(Arc::new(NullMlSource));
        ensemble_scores(draws, &StrategyWeights::default(), Stream::Winning, &strategies)
    }

    #[test]
    fn test_deterministic() {
        let draws = make_test_draws(80);
        let a = scored(&draws);
        let b = scored(&draws);
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.votes, b.votes);
    }

    #[test]
    fn test_scores_finite_non_negative() {
        let draws = make_test_draws(80);
        let map = scored(&draws);
        for &s in &map.scores {
            assert!(s.is_finite());
            assert!(s >= 0.0);
        }
    }

    #[test]
    fn test_empty_draws_empty_map() {
        let map = scored(&[]);
        assert!(map.scores.iter().all(|&s| s == 0.0));
        assert!(map.votes.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_ubiquitous_number_in_top_three_and_selected() {
        let mut draws = make_test_draws(200);
        for d in &mut draws {
            if !d.winning.contains(&7) {
                d.winning[0] = 7;
            }
        }
        let map = scored(&draws);
        let top: Vec<u8> = map.top(3).into_iter().map(|(n, _)| n).collect();
        assert!(top.contains(&7), "top-3 = {top:?}");
        let selected = crate::selector::select_numbers(&map);
        assert!(selected.contains(&7), "sélection = {selected:?}");
    }

    #[test]
    fn test_neighbor_redistribution_in_range() {
        let mut scores = [0.0f64; POOL_SIZE];
        scores[0] = 10.0; // numéro 1 : seul le voisin 2 reçoit
        scores[89] = 10.0; // numéro 90 : seul le voisin 89 reçoit
        redistribute_neighbors(&mut scores);
        assert!((scores[1] - 1.5).abs() < 1e-9);
        assert!((scores[88] - 1.5).abs() < 1e-9);
        assert!((scores[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_neighbor_redistribution_single_pass() {
        // La part reçue par un voisin ne se propage pas en cascade.
        let mut scores = [0.0f64; POOL_SIZE];
        scores[10] = 10.0;
        redistribute_neighbors(&mut scores);
        assert!((scores[9] - 1.5).abs() < 1e-9);
        assert!((scores[11] - 1.5).abs() < 1e-9);
        assert_eq!(scores[8], 0.0);
        assert_eq!(scores[12], 0.0);
    }

    #[test]
    fn test_consensus_amplifier() {
        let mut map = ScoreMap::empty();
        map.scores[0] = 1.0;
        map.votes[0] = 5;
        map.scores[1] = 1.0;
        map.votes[1] = 3;
        map.scores[2] = 3.0;
        map.votes[2] = 0;
        map.scores[3] = 1.0;
        map.votes[3] = 0;
        amplify_consensus(&mut map);
        assert!((map.scores[0] - 1.20).abs() < 1e-9);
        assert!((map.scores[1] - 1.10).abs() < 1e-9);
        assert!((map.scores[2] - 2.55).abs() < 1e-9, "loup solitaire");
        assert!((map.scores[3] - 1.0).abs() < 1e-9, "score modeste épargné");
    }

    #[test]
    fn test_symmetric_hot_due_selection_decade_balanced() {
        // 1..5 sont brûlants (présents dans tous les tirages récents),
        // 86..90 sont très en retard après des cycles réguliers. Avec
        // des poids hot/due symétriques, la sélection ne peut retenir
        // que 2 numéros par dizaine.
        let mut draws = make_test_draws(120);
        let n = draws.len();
        for (t, d) in draws.iter_mut().enumerate() {
            if t < 60 && t % 3 == 0 {
                d.winning = [86, 87, 88, 89, 90];
            } else if t >= n - 30 {
                d.winning = [1, 2, 3, 4, 5];
            }
        }
        let mut weights = StrategyWeights::default();
        weights.hot = 0.5;
        weights.due = 0.5;
        weights.correlation = 0.0;
        weights.position = 0.0;
        weights.balanced = 0.0;
        weights.statistical = 0.0;
        weights.finales = 0.0;
        weights.lstm = 0.0;
        let strategies = all_strategies(Arc::new(NullMlSource));
        let map = ensemble_scores(&draws, &weights, Stream::Winning, &strategies);
        for &s in &map.scores {
            assert!(s.is_finite() && s >= 0.0);
        }
        let selected = crate::selector::select_numbers(&map);
        assert_eq!(selected.len(), 5);
        let low = selected.iter().filter(|&&n| n <= 5).count();
        let high = selected.iter().filter(|&&n| n >= 86).count();
        assert!(low <= 2, "sélection = {selected:?}");
        assert!(high <= 2, "sélection = {selected:?}");
    }
}
