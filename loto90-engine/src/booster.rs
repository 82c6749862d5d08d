//! Amplificateur de corrélation croisée : les co-occurrences
//! machine → gagnants renforcent la sélection hybride.

use loto90_db::models::{Draw, POOL_SIZE};

use crate::scorer::ScoreMap;

pub const DEFAULT_BOOST_FACTOR: f64 = 1.30;
const TOP_CORRELATED: usize = 10;

/// Matrice de co-occurrence : counts[m][w] = tirages où le numéro
/// machine m et le numéro gagnant w apparaissent ensemble.
pub struct CorrelationMatrix {
    counts: Box<[[u32; POOL_SIZE]; POOL_SIZE]>,
}

impl CorrelationMatrix {
    pub fn build(draws: &[Draw]) -> Self {
        let mut counts = Box::new([[0u32; POOL_SIZE]; POOL_SIZE]);
        for draw in draws {
            if let Some(machine) = &draw.machine {
                for &m in machine {
                    for &w in &draw.winning {
                        counts[(m - 1) as usize][(w - 1) as usize] += 1;
                    }
                }
            }
        }
        Self { counts }
    }

    /// Les gagnants les plus corrélés à un numéro machine, comptes
    /// décroissants puis numéro croissant. Les comptes nuls sont exclus.
    pub fn top_correlated(&self, machine: u8, k: usize) -> Vec<(u8, u32)> {
        let row = &self.counts[(machine - 1) as usize];
        let mut ranked: Vec<(u8, u32)> = row
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| ((i + 1) as u8, c))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    pub fn max_count(&self) -> u32 {
        self.counts
            .iter()
            .flat_map(|row| row.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct HybridBoost {
    pub map: ScoreMap,
    /// Gagnants amplifiés, numéro croissant.
    pub boosted: Vec<u8>,
    /// Connexion de la prédiction machine au volet gagnant, dans [0, 1].
    pub correlation_strength: f64,
}

/// Amplifie les scores gagnants recommandés par la prédiction machine.
/// Chaque gagnant encore présent dans la carte est multiplié par le
/// facteur exactement une fois, même si plusieurs numéros machine le
/// recommandent.
pub fn boost_scores(
    base: &ScoreMap,
    machine_prediction: &[u8],
    matrix: &CorrelationMatrix,
    boost_factor: f64,
) -> HybridBoost {
    let mut map = base.clone();
    let mut boosted: Vec<u8> = Vec::new();
    let mut strength_terms: Vec<f64> = Vec::new();
    let max_count = matrix.max_count();

    for &m in machine_prediction {
        let correlated = matrix.top_correlated(m, TOP_CORRELATED);
        if !correlated.is_empty() {
            let avg = correlated.iter().map(|&(_, c)| c as f64).sum::<f64>()
                / correlated.len() as f64;
            strength_terms.push(avg);
        }
        for (w, _) in correlated {
            let idx = (w - 1) as usize;
            if map.scores[idx] > 0.0 && !boosted.contains(&w) {
                map.scores[idx] *= boost_factor;
                boosted.push(w);
            }
        }
    }
    boosted.sort_unstable();

    let correlation_strength = if strength_terms.is_empty() || max_count == 0 {
        0.0
    } else {
        let mean = strength_terms.iter().sum::<f64>() / strength_terms.len() as f64;
        (mean / max_count as f64).clamp(0.0, 1.0)
    };

    HybridBoost {
        map,
        boosted,
        correlation_strength,
    }
}
