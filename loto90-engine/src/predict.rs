//! Orchestration d'une prédiction complète : volet gagnant et volet
//! machine en parallèle, amplification hybride, grilles alternatives,
//! alertes et résumé d'analyse.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use loto90_db::models::{Draw, Stream};

use crate::analysis::{cycles, decades, finales, stream_history};
use crate::booster::{boost_scores, CorrelationMatrix, DEFAULT_BOOST_FACTOR};
use crate::brain::StrategyWeights;
use crate::evaluate::TopCandidate;
use crate::history::{PredictionLog, PredictionRecord};
use crate::scorer::ensemble_scores;
use crate::selector::{confidence, hybrid_confidence, select_numbers};
use crate::strategies::{mixed::rank_mixed, Strategy, StrategyKey};

/// En dessous de ce nombre de tirages au jour demandé, le filtre jour
/// est abandonné au profit de l'historique complet.
const DAY_FILTER_MIN_DRAWS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionContext {
    pub draw_type_id: Option<i64>,
    pub day_of_week: Option<u8>,
    pub draws_analyzed: usize,
    /// Faux quand le filtre jour a été abandonné faute de tirages.
    pub day_filter_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPrediction {
    pub numbers: Vec<u8>,
    pub sum: u32,
    pub confidence: f64,
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridPrediction {
    pub numbers: Vec<u8>,
    pub sum: u32,
    pub confidence: f64,
    pub scores: Vec<f64>,
    pub method: String,
    pub correlation_strength: f64,
    pub boosted_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub label: String,
    pub numbers: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: String,
    pub message: String,
    pub numbers: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_draws: usize,
    pub last_draw_date: Option<NaiveDateTime>,
    pub decade_counts: [u32; 9],
    pub top_due: Vec<u8>,
    pub top_hot: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPerformance {
    pub draw_date: NaiveDateTime,
    pub match_count: u8,
    pub near_miss_count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub context: PredictionContext,
    pub main: StreamPrediction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<StreamPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<HybridPrediction>,
    pub alternatives: Vec<Alternative>,
    pub alerts: Vec<Alert>,
    pub top_candidates: Vec<TopCandidate>,
    pub analysis: AnalysisSummary,
    pub generated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_performance: Option<LastPerformance>,
}

/// Paramètres d'un calcul de prédiction.
pub struct PredictionRequest<'a> {
    pub draws: &'a [Draw],
    pub draw_type_id: Option<i64>,
    pub day_of_week: Option<u8>,
    pub winning_weights: &'a StrategyWeights,
    pub machine_weights: &'a StrategyWeights,
    pub strategies: &'a [Box<dyn Strategy>],
    pub now: NaiveDateTime,
}

pub fn predict(request: &PredictionRequest<'_>, log: Option<&dyn PredictionLog>) -> Prediction {
    let (working, day_filter_applied) = day_filtered(request.draws, request.day_of_week);

    let winning_map = ensemble_scores(
        &working,
        request.winning_weights,
        Stream::Winning,
        request.strategies,
    );
    let main_numbers = select_numbers(&winning_map);
    let main = StreamPrediction {
        sum: main_numbers.iter().map(|&n| n as u32).sum(),
        confidence: confidence(&winning_map, &main_numbers),
        scores: main_numbers.iter().map(|&n| winning_map.score_of(n)).collect(),
        numbers: main_numbers.clone(),
    };

    // Volet machine : seulement si l'historique en contient.
    let machine_sets = stream_history(&working, Stream::Machine);
    let (machine, hybrid) = if machine_sets.is_empty() {
        (None, None)
    } else {
        let machine_map = ensemble_scores(
            &working,
            request.machine_weights,
            Stream::Machine,
            request.strategies,
        );
        let machine_numbers = select_numbers(&machine_map);
        let machine_pred = StreamPrediction {
            sum: machine_numbers.iter().map(|&n| n as u32).sum(),
            confidence: confidence(&machine_map, &machine_numbers),
            scores: machine_numbers
                .iter()
                .map(|&n| machine_map.score_of(n))
                .collect(),
            numbers: machine_numbers.clone(),
        };

        let matrix = CorrelationMatrix::build(&working);
        let boost = boost_scores(&winning_map, &machine_numbers, &matrix, DEFAULT_BOOST_FACTOR);
        let hybrid_numbers = select_numbers(&boost.map);
        let hybrid_pred = HybridPrediction {
            sum: hybrid_numbers.iter().map(|&n| n as u32).sum(),
            confidence: hybrid_confidence(&boost.map, &hybrid_numbers),
            scores: hybrid_numbers
                .iter()
                .map(|&n| boost.map.score_of(n))
                .collect(),
            numbers: hybrid_numbers,
            method: "correlation_boost".to_string(),
            correlation_strength: boost.correlation_strength,
            boosted_count: boost.boosted.len(),
        };
        (Some(machine_pred), Some(hybrid_pred))
    };

    let alternatives = build_alternatives(&working, request.strategies);
    let sets = stream_history(&working, Stream::Winning);
    let cycle_stats = cycles::cycle_analysis(&sets);
    let alerts = build_alerts(&cycle_stats, &sets);

    let top_candidates = winning_map
        .top(10)
        .into_iter()
        .map(|(n, s)| TopCandidate {
            number: n,
            score: s,
            votes: winning_map.votes[(n - 1) as usize],
        })
        .collect();

    let analysis = build_summary(&working, &cycle_stats, request.strategies);

    let last_performance = log.and_then(last_performance_from);

    Prediction {
        context: PredictionContext {
            draw_type_id: request.draw_type_id,
            day_of_week: request.day_of_week,
            draws_analyzed: working.len(),
            day_filter_applied,
        },
        main,
        machine,
        hybrid,
        alternatives,
        alerts,
        top_candidates,
        analysis,
        generated_at: request.now,
        last_performance,
    }
}

/// Journalise une prédiction servie, pour la boucle de vérification.
pub fn log_prediction(prediction: &Prediction, log: &dyn PredictionLog) {
    let record = PredictionRecord {
        timestamp: prediction.generated_at,
        draw_type_id: prediction.context.draw_type_id,
        day_of_week: prediction.context.day_of_week,
        predicted_numbers: prediction.main.numbers.clone(),
        confidence: prediction.main.confidence,
        scores: prediction.main.scores.clone(),
        machine_numbers: prediction.machine.as_ref().map(|m| m.numbers.clone()),
        machine_confidence: prediction.machine.as_ref().map(|m| m.confidence),
        hybrid_numbers: prediction.hybrid.as_ref().map(|h| h.numbers.clone()),
        hybrid_confidence: prediction.hybrid.as_ref().map(|h| h.confidence),
        result: None,
        machine_result: None,
        hybrid_result: None,
    };
    if let Err(e) = log.append(record) {
        tracing::warn!("journalisation de la prédiction impossible : {e:#}");
    }
}

/// Filtre par jour de semaine, abandonné (et signalé) sous 10 tirages.
pub fn day_filtered(draws: &[Draw], day: Option<u8>) -> (Vec<Draw>, bool) {
    match day {
        Some(day) => {
            let filtered: Vec<Draw> = draws
                .iter()
                .filter(|d| d.day_of_week == day)
                .cloned()
                .collect();
            if filtered.len() >= DAY_FILTER_MIN_DRAWS {
                (filtered, true)
            } else {
                (draws.to_vec(), false)
            }
        }
        None => (draws.to_vec(), false),
    }
}

/// Les quatre grilles alternatives canoniques.
fn build_alternatives(draws: &[Draw], strategies: &[Box<dyn Strategy>]) -> Vec<Alternative> {
    let mut alternatives = Vec::with_capacity(4);
    for key in [StrategyKey::Hot, StrategyKey::Due, StrategyKey::Balanced] {
        if let Some(strategy) = strategies.iter().find(|s| s.key() == key) {
            let numbers = strategy.rank(draws, 5, Stream::Winning);
            if !numbers.is_empty() {
                alternatives.push(Alternative {
                    label: key.as_str().to_string(),
                    numbers,
                });
            }
        }
    }
    let mixed = rank_mixed(draws, 5, Stream::Winning);
    if !mixed.is_empty() {
        alternatives.push(Alternative {
            label: "mixed".to_string(),
            numbers: mixed,
        });
    }
    alternatives
}

fn build_alerts(cycle_stats: &[cycles::CycleStats], sets: &[[u8; 5]]) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let mut overdue: Vec<u8> = cycle_stats
        .iter()
        .filter(|s| s.due_score >= 150.0 && s.cycle_count >= 5)
        .map(|s| s.number)
        .collect();
    overdue.sort_unstable();
    if !overdue.is_empty() {
        alerts.push(Alert {
            kind: "overdue".to_string(),
            message: format!("{} numéro(s) très en retard sur leur cycle", overdue.len()),
            numbers: overdue,
        });
    }

    let finale_stats = finales::finale_analysis(sets);
    let mut hot_finales: Vec<u8> = finale_stats
        .iter()
        .filter(|f| f.percentage >= 15.0 && f.appearances > 0)
        .map(|f| f.finale)
        .collect();
    hot_finales.sort_unstable();
    if !hot_finales.is_empty() {
        alerts.push(Alert {
            kind: "finale".to_string(),
            message: format!("Finale(s) dominante(s) : {hot_finales:?}"),
            numbers: hot_finales,
        });
    }

    alerts
}

fn build_summary(
    draws: &[Draw],
    cycle_stats: &[cycles::CycleStats],
    strategies: &[Box<dyn Strategy>],
) -> AnalysisSummary {
    let sets = stream_history(draws, Stream::Winning);
    let decade_stats = decades::decade_analysis(&sets);

    let mut due_ranked: Vec<(u8, f64)> = cycle_stats
        .iter()
        .filter(|s| s.cycle_count >= 3)
        .map(|s| (s.number, s.due_score))
        .collect();
    due_ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let top_hot = strategies
        .iter()
        .find(|s| s.key() == StrategyKey::Hot)
        .map(|s| s.rank(draws, 5, Stream::Winning))
        .unwrap_or_default();

    AnalysisSummary {
        total_draws: draws.len(),
        last_draw_date: draws.last().map(|d| d.date),
        decade_counts: decade_stats.counts,
        top_due: due_ranked.into_iter().take(5).map(|(n, _)| n).collect(),
        top_hot,
    }
}

fn last_performance_from(log: &dyn PredictionLog) -> Option<LastPerformance> {
    log.entries().into_iter().find_map(|entry| {
        entry.result.map(|r| LastPerformance {
            draw_date: r.draw_date,
            match_count: r.match_count,
            near_miss_count: r.near_misses.len() as u8,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::make_test_draws;
    use crate::ml::NullMlSource;
    use crate::strategies::all_strategies;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    fn run(draws: &[Draw], day: Option<u8>) -> Prediction {
        let strategies = all_strategies(Arc::new(NullMlSource));
        let weights = StrategyWeights::default();
        predict(
            &PredictionRequest {
                draws,
                draw_type_id: Some(1),
                day_of_week: day,
                winning_weights: &weights,
                machine_weights: &weights,
                strategies: &strategies,
                now: now(),
            },
            None,
        )
    }

    #[test]
    fn test_full_prediction_shape() {
        let draws = make_test_draws(120);
        let p = run(&draws, None);
        assert_eq!(p.main.numbers.len(), 5);
        assert!(p.main.confidence > 0.0);
        assert!(p.machine.is_some());
        let hybrid = p.hybrid.as_ref().unwrap();
        assert_eq!(hybrid.numbers.len(), 5);
        assert!(hybrid.correlation_strength >= 0.0 && hybrid.correlation_strength <= 1.0);
        assert!(!p.alternatives.is_empty());
        assert!(p.top_candidates.len() <= 10);
        assert_eq!(p.analysis.total_draws, 120);
    }

    #[test]
    fn test_zero_draws_empty_selection_zero_confidence() {
        let p = run(&[], None);
        assert!(p.main.numbers.is_empty());
        assert_eq!(p.main.confidence, 0.0);
        assert!(p.machine.is_none());
        assert!(p.hybrid.is_none());
        assert!(p.alternatives.is_empty());
    }

    #[test]
    fn test_no_machine_history_no_hybrid() {
        let mut draws = make_test_draws(60);
        for d in &mut draws {
            d.machine = None;
        }
        let p = run(&draws, None);
        assert!(p.machine.is_none());
        assert!(p.hybrid.is_none());
        assert_eq!(p.main.numbers.len(), 5);
    }

    #[test]
    fn test_day_filter_applied_and_surfaced() {
        let draws = make_test_draws(120);
        let day = draws[0].day_of_week;
        let p = run(&draws, Some(day));
        assert!(p.context.day_filter_applied);
        assert!(p.context.draws_analyzed < 120);
    }

    #[test]
    fn test_day_filter_fallback_surfaced() {
        // 8 tirages seulement : moins de 10 au jour demandé, retour à
        // l'historique complet.
        let draws = make_test_draws(8);
        let day = draws[0].day_of_week;
        let p = run(&draws, Some(day));
        assert!(!p.context.day_filter_applied);
        assert_eq!(p.context.draws_analyzed, 8);
    }

    #[test]
    fn test_prediction_logged_for_verification() {
        let draws = make_test_draws(60);
        let p = run(&draws, None);
        let log = crate::history::InMemoryPredictionLog::default();
        log_prediction(&p, &log);
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].predicted_numbers, p.main.numbers);
        assert_eq!(
            entries[0].hybrid_numbers.as_ref().unwrap(),
            &p.hybrid.as_ref().unwrap().numbers
        );
        assert!(entries[0].result.is_none());
    }

    #[test]
    fn test_last_performance_surfaced() {
        use crate::history::{InMemoryPredictionLog, VerifiedResult};

        let log = InMemoryPredictionLog::default();
        let draws = make_test_draws(60);
        let p = run(&draws, None);
        log_prediction(&p, &log);
        let mut entries = log.entries();
        entries[0].result = Some(VerifiedResult {
            draw_date: now(),
            actual: vec![1, 2, 3, 4, 5],
            match_count: 2,
            matches: vec![1, 2],
            near_misses: vec![6],
        });
        log.replace(entries).unwrap();

        let strategies = all_strategies(Arc::new(NullMlSource));
        let weights = StrategyWeights::default();
        let p = predict(
            &PredictionRequest {
                draws: &draws,
                draw_type_id: Some(1),
                day_of_week: None,
                winning_weights: &weights,
                machine_weights: &weights,
                strategies: &strategies,
                now: now(),
            },
            Some(&log),
        );
        let perf = p.last_performance.unwrap();
        assert_eq!(perf.match_count, 2);
        assert_eq!(perf.near_miss_count, 1);
    }
}
