//! Évaluation d'une grille proposée par l'utilisateur contre la carte
//! de scores courante.

use serde::Serialize;

use loto90_db::models::{Draw, Stream};

use crate::analysis::{correlations, stream_history};
use crate::brain::StrategyWeights;
use crate::error::EngineError;
use crate::scorer::ensemble_scores;
use crate::strategies::{hot::rank_by_frequency, Strategy};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedNumber {
    pub number: u8,
    pub score: f64,
    pub is_hot: bool,
    pub is_warm: bool,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCandidate {
    pub number: u8,
    pub score: f64,
    pub votes: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridEvaluation {
    pub numbers: Vec<EvaluatedNumber>,
    pub total_score: f64,
    pub confidence: f64,
    pub matches: u8,
    pub strong_matches: u8,
    pub synergy_bonus: f64,
    pub analysis: String,
    pub top_candidates: Vec<TopCandidate>,
    pub recommendation: String,
}

const HOT_WINDOW: usize = 10;
const WARM_WINDOW: usize = 30;
const MATCH_WINDOW: usize = 15;
const STRONG_WINDOW: usize = 5;
const SYNERGY_PER_PAIR: f64 = 2.0;

/// Valide puis évalue une grille de 5 numéros.
pub fn evaluate_grid(
    numbers: &[u8],
    draws: &[Draw],
    weights: &StrategyWeights,
    strategies: &[Box<dyn Strategy>],
) -> Result<GridEvaluation, EngineError> {
    let grid = validate_grid(numbers)?;

    let map = ensemble_scores(draws, weights, Stream::Winning, strategies);
    let sets = stream_history(draws, Stream::Winning);
    let hot = rank_by_frequency(&sets, HOT_WINDOW);
    let warm: Vec<u8> = map.top(WARM_WINDOW).into_iter().map(|(n, _)| n).collect();
    let match_pool: Vec<u8> = map.top(MATCH_WINDOW).into_iter().map(|(n, _)| n).collect();
    let strong_pool: Vec<u8> = map.top(STRONG_WINDOW).into_iter().map(|(n, _)| n).collect();

    let evaluated: Vec<EvaluatedNumber> = grid
        .iter()
        .map(|&n| EvaluatedNumber {
            number: n,
            score: map.score_of(n),
            is_hot: hot.contains(&n),
            is_warm: !hot.contains(&n) && warm.contains(&n),
        })
        .collect();

    let matches = grid.iter().filter(|n| match_pool.contains(n)).count() as u8;
    let strong_matches = grid.iter().filter(|n| strong_pool.contains(n)).count() as u8;

    // Bonus de synergie : paires de la grille présentes dans la table
    // des paires à lift.
    let correlations = correlations::correlation_analysis(&sets);
    let mut synergy_bonus = 0.0;
    for i in 0..grid.len() {
        for j in (i + 1)..grid.len() {
            if correlations::pair_lift(&correlations, grid[i], grid[j]).is_some() {
                synergy_bonus += SYNERGY_PER_PAIR;
            }
        }
    }

    let total_score =
        evaluated.iter().map(|e| e.score).sum::<f64>() + synergy_bonus;
    let avg = evaluated.iter().map(|e| e.score).sum::<f64>() / grid.len() as f64;
    let confidence = (avg * 100.0 + 40.0).min(95.0);

    let recommendation = recommend(strong_matches, matches, confidence);
    let analysis = format!(
        "{} numéro(s) dans le top-{MATCH_WINDOW}, {} dans le top-{STRONG_WINDOW}, synergie {:.1}",
        matches, strong_matches, synergy_bonus
    );

    let top_candidates = map
        .top(10)
        .into_iter()
        .map(|(n, s)| TopCandidate {
            number: n,
            score: s,
            votes: map.votes[(n - 1) as usize],
        })
        .collect();

    Ok(GridEvaluation {
        numbers: evaluated,
        total_score,
        confidence,
        matches,
        strong_matches,
        synergy_bonus,
        analysis,
        top_candidates,
        recommendation,
    })
}

fn validate_grid(numbers: &[u8]) -> Result<[u8; 5], EngineError> {
    if numbers.len() != 5 {
        return Err(EngineError::InvalidInput(format!(
            "5 numéros attendus, reçu {}",
            numbers.len()
        )));
    }
    let mut grid = [0u8; 5];
    grid.copy_from_slice(numbers);
    for &n in &grid {
        if !(1..=90).contains(&n) {
            return Err(EngineError::InvalidInput(format!(
                "numéro {n} hors limites (1-90)"
            )));
        }
    }
    for i in 0..5 {
        for j in (i + 1)..5 {
            if grid[i] == grid[j] {
                return Err(EngineError::InvalidInput(format!(
                    "numéro en double : {}",
                    grid[i]
                )));
            }
        }
    }
    Ok(grid)
}

fn recommend(strong_matches: u8, matches: u8, confidence: f64) -> String {
    if strong_matches >= 2 || confidence >= 80.0 {
        "Excellent"
    } else if matches >= 2 || confidence >= 65.0 {
        "Bon"
    } else if confidence >= 50.0 {
        "Moyen"
    } else {
        "Risqué"
    }
    .to_string()
}
