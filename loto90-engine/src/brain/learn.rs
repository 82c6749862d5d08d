//! Pas d'apprentissage : confronte la prédiction que l'ensemble aurait
//! faite à un tirage observé, puis ajuste les poids des stratégies.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use loto90_db::models::{Draw, Stream};

use crate::selector::select_numbers;
use crate::strategies::Strategy;
use super::{Brain, DrawSignature, HISTORY_CAP};

const LEARNING_RATE: f64 = 0.05;
const STRAT_TOP: usize = 10;

#[derive(Debug, Clone)]
pub struct LearnOutcome {
    pub global_match: u8,
    pub matched: Vec<u8>,
    pub strat_scores: BTreeMap<String, f64>,
}

/// Numéros prédits à ±1 d'un numéro tiré, sans correspondance exacte.
pub fn near_misses(predicted: &[u8], actual: &[u8]) -> Vec<u8> {
    predicted
        .iter()
        .copied()
        .filter(|p| !actual.contains(p))
        .filter(|&p| actual.iter().any(|&a| p.abs_diff(a) == 1))
        .collect()
}

/// Apprend d'un tirage observé.
///
/// Le tirage lui-même (et tout tirage au même jeu de numéros) est
/// retiré de l'historique d'entraînement avant de rejouer l'ensemble.
/// L'appelant persiste ensuite le cerveau.
pub fn learn(
    brain: &mut Brain,
    actual: &Draw,
    all_draws: &[Draw],
    draw_type_id: Option<i64>,
    stream: Stream,
    strategies: &[Box<dyn Strategy>],
    now: NaiveDateTime,
) -> Option<LearnOutcome> {
    let actual_set = *stream.numbers_from(actual)?;
    let mut actual_sorted = actual_set;
    actual_sorted.sort_unstable();

    // Garde anti-fuite : aucun tirage égal au tirage observé (par jeu
    // de numéros) ne participe à l'entraînement.
    let training: Vec<Draw> = all_draws
        .iter()
        .filter(|d| {
            stream.numbers_from(d).map_or(true, |set| {
                let mut sorted = *set;
                sorted.sort_unstable();
                sorted != actual_sorted
            })
        })
        .cloned()
        .collect();

    let map = brain.score(&training, stream, strategies);
    let predicted = select_numbers(&map);
    let matched: Vec<u8> = predicted
        .iter()
        .copied()
        .filter(|n| actual_set.contains(n))
        .collect();
    let global_match = matched.len() as u8;

    brain.stats.global.record(global_match);
    if let Some(type_id) = draw_type_id {
        brain
            .stats
            .by_type
            .entry(type_id)
            .or_default()
            .record(global_match);
    }

    // Score individuel : 1 point par numéro exact du top-10 de la
    // stratégie, 0.25 par quasi-réussite.
    let mut strat_scores: BTreeMap<String, f64> = BTreeMap::new();
    for strategy in strategies {
        let top = strategy.rank(&training, STRAT_TOP, stream);
        let exact = top.iter().filter(|n| actual_set.contains(n)).count() as f64;
        let near = near_misses(&top, &actual_set).len() as f64;
        strat_scores.insert(strategy.key().as_str().to_string(), exact + 0.25 * near);
    }

    for strategy in strategies {
        let key = strategy.key();
        if !key.is_tuned() {
            continue;
        }
        let score = strat_scores.get(key.as_str()).copied().unwrap_or(0.0);
        let delta = if score >= 3.0 {
            2.0 * LEARNING_RATE
        } else if score >= 1.0 {
            LEARNING_RATE
        } else {
            -0.5 * LEARNING_RATE
        };
        brain.weights.set(key, brain.weights.get(key) + delta);
    }
    brain.weights.clamp_normalize();

    brain.history.push_back(super::LearnRecord {
        date: now,
        draw: actual_sorted.to_vec(),
        strat_scores: strat_scores.clone(),
        global_match,
        new_weights: brain.weights.to_map(),
    });
    while brain.history.len() > HISTORY_CAP {
        brain.history.pop_front();
    }

    brain.last_tuned = Some(now);
    brain.last_analyzed_draw = Some(DrawSignature {
        date: actual.date,
        numbers: actual_set,
    });

    Some(LearnOutcome {
        global_match,
        matched,
        strat_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::make_test_draws;
    use crate::ml::NullMlSource;
    use crate::strategies::{all_strategies, StrategyKey};
    use crate::brain::{StrategyWeights, WEIGHT_MAX, WEIGHT_MIN};

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_near_misses_disjoint_from_matches() {
        let predicted = [7, 15, 23, 42, 71];
        let actual = [7, 16, 50, 60, 70];
        // 7 exact ; 15 à 1 de 16 ; 71 à 1 de 70.
        let near = near_misses(&predicted, &actual);
        assert_eq!(near, vec![15, 71]);
        assert!(!near.contains(&7));
    }

    #[test]
    fn test_learn_updates_stats_and_history() {
        let draws = make_test_draws(100);
        let actual = draws.last().unwrap().clone();
        let mut brain = Brain::default();
        let strategies = all_strategies(Arc::new(NullMlSource));

        let outcome = learn(
            &mut brain,
            &actual,
            &draws,
            Some(1),
            Stream::Winning,
            &strategies,
            now(),
        )
        .unwrap();

        assert_eq!(brain.stats.global.total_draws, 1);
        assert_eq!(brain.stats.global.total_hits, outcome.global_match as u64);
        assert_eq!(brain.stats.by_type.get(&1).unwrap().total_draws, 1);
        assert_eq!(brain.history.len(), 1);
        assert_eq!(brain.last_tuned, Some(now()));
        assert_eq!(
            brain.last_analyzed_draw.as_ref().unwrap().numbers,
            actual.winning
        );
    }

    #[test]
    fn test_weights_invariants_after_learn() {
        let draws = make_test_draws(120);
        let mut brain = Brain::default();
        let strategies = all_strategies(Arc::new(NullMlSource));

        for actual in draws.iter().rev().take(10) {
            learn(
                &mut brain,
                actual,
                &draws,
                None,
                Stream::Winning,
                &strategies,
                now(),
            );
            assert!((brain.weights.sum() - 1.0).abs() < 1e-6);
            for key in StrategyKey::ALL {
                let v = brain.weights.get(key);
                assert!((WEIGHT_MIN - 1e-9..=WEIGHT_MAX + 1e-9).contains(&v));
            }
        }
    }

    #[test]
    fn test_learn_deterministic() {
        let draws = make_test_draws(100);
        let actual = draws.last().unwrap().clone();
        let strategies = all_strategies(Arc::new(NullMlSource));

        let mut a = Brain::default();
        let mut b = Brain::default();
        learn(&mut a, &actual, &draws, None, Stream::Winning, &strategies, now());
        learn(&mut b, &actual, &draws, None, Stream::Winning, &strategies, now());
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_history_bounded_to_fifty() {
        let draws = make_test_draws(80);
        let mut brain = Brain::default();
        let strategies = all_strategies(Arc::new(NullMlSource));

        for _ in 0..60 {
            learn(
                &mut brain,
                draws.last().unwrap(),
                &draws,
                None,
                Stream::Winning,
                &strategies,
                now(),
            );
        }
        assert_eq!(brain.history.len(), HISTORY_CAP);
    }

    #[test]
    fn test_leakage_guard_excludes_actual() {
        // Historique où le tirage observé est aussi le dernier de la
        // liste : il ne doit pas s'auto-prédire.
        let mut draws = make_test_draws(60);
        let actual = draws.last().unwrap().clone();
        draws.push(actual.clone());
        let mut brain = Brain::default();
        let strategies = all_strategies(Arc::new(NullMlSource));

        // Avec la garde, l'apprentissage voit un historique sans aucun
        // tirage au jeu de numéros observé : le hot ne peut pas être
        // parfait grâce à une fuite.
        let outcome = learn(
            &mut brain,
            &actual,
            &draws,
            None,
            Stream::Winning,
            &strategies,
            now(),
        )
        .unwrap();
        assert!(outcome.global_match <= 5);
        let sig = brain.last_analyzed_draw.unwrap();
        assert_eq!(sig.numbers, actual.winning);
    }

    #[test]
    fn test_machine_learn_requires_machine_set() {
        let mut draws = make_test_draws(30);
        let mut actual = draws.last().unwrap().clone();
        actual.machine = None;
        draws.push(actual.clone());
        let mut brain = Brain::default();
        let strategies = all_strategies(Arc::new(NullMlSource));

        let outcome = learn(
            &mut brain,
            &actual,
            &draws,
            None,
            Stream::Machine,
            &strategies,
            now(),
        );
        assert!(outcome.is_none());
        assert_eq!(brain.stats.global.total_draws, 0);
    }

    #[test]
    fn test_strong_strategy_gains_double_step() {
        // L'historique rejoue presque exactement le tirage observé :
        // hot marque ≥ 3 et gagne 2·LR avant normalisation.
        let mut draws = make_test_draws(100);
        for d in &mut draws {
            d.winning = [7, 15, 23, 42, 71];
        }
        let mut actual = draws.last().unwrap().clone();
        actual.winning = [7, 15, 23, 42, 70];
        let strategies = all_strategies(Arc::new(NullMlSource));

        let mut brain = Brain::default();
        let before = StrategyWeights::default();
        learn(&mut brain, &actual, &draws, None, Stream::Winning, &strategies, now());
        let record = brain.history.back().unwrap();
        assert!(*record.strat_scores.get("hot").unwrap() >= 3.0);
        // La normalisation rabote tout le monde ; le gain se lit en
        // relatif face au poids lstm, jamais ajusté.
        assert!(brain.weights.hot / brain.weights.lstm > before.hot / before.lstm);
    }
}
