//! Pool de stratégies : chacune produit une liste ordonnée d'au plus
//! `k` numéros distincts à partir d'une séquence chronologique de
//! tirages. Les égalités se départagent toujours par numéro croissant.

pub mod balanced;
pub mod correlation;
pub mod due;
pub mod finales;
pub mod hot;
pub mod mixed;
pub mod ml;
pub mod position;
pub mod statistical;

use std::sync::Arc;

use loto90_db::models::{Draw, Stream};

use crate::ml::MlSource;

/// Clés des stratégies pondérées par le cerveau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKey {
    Hot,
    Due,
    Correlation,
    Position,
    Balanced,
    Statistical,
    Finales,
    Lstm,
}

impl StrategyKey {
    pub const ALL: [StrategyKey; 8] = [
        StrategyKey::Hot,
        StrategyKey::Due,
        StrategyKey::Correlation,
        StrategyKey::Position,
        StrategyKey::Balanced,
        StrategyKey::Statistical,
        StrategyKey::Finales,
        StrategyKey::Lstm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKey::Hot => "hot",
            StrategyKey::Due => "due",
            StrategyKey::Correlation => "correlation",
            StrategyKey::Position => "position",
            StrategyKey::Balanced => "balanced",
            StrategyKey::Statistical => "statistical",
            StrategyKey::Finales => "finales",
            StrategyKey::Lstm => "lstm",
        }
    }

    pub fn from_str(s: &str) -> Option<StrategyKey> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Le poids `lstm` est gouverné à l'extérieur ; tout le reste est
    /// ajusté par l'apprentissage.
    pub fn is_tuned(&self) -> bool {
        !matches!(self, StrategyKey::Lstm)
    }
}

impl std::fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Strategy: Send + Sync {
    fn key(&self) -> StrategyKey;
    /// Liste ordonnée d'au plus `k` numéros distincts. Ne propage jamais
    /// d'erreur : une stratégie sans matière retourne une liste vide.
    fn rank(&self, draws: &[Draw], k: usize, stream: Stream) -> Vec<u8>;
}

pub const WEIGHT_MIN: f64 = 0.05;
pub const WEIGHT_MAX: f64 = 0.60;

/// Poids des huit stratégies. Enregistrement à clés fixes : une clé
/// inconnue est rejetée au chargement, une clé manquante est injectée
/// avec sa valeur par défaut.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyWeights {
    pub hot: f64,
    pub due: f64,
    pub correlation: f64,
    pub position: f64,
    pub balanced: f64,
    pub statistical: f64,
    pub finales: f64,
    pub lstm: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            hot: 0.20,
            due: 0.15,
            correlation: 0.15,
            position: 0.10,
            balanced: 0.10,
            statistical: 0.10,
            finales: 0.10,
            lstm: 0.10,
        }
    }
}

impl StrategyWeights {
    pub fn get(&self, key: StrategyKey) -> f64 {
        match key {
            StrategyKey::Hot => self.hot,
            StrategyKey::Due => self.due,
            StrategyKey::Correlation => self.correlation,
            StrategyKey::Position => self.position,
            StrategyKey::Balanced => self.balanced,
            StrategyKey::Statistical => self.statistical,
            StrategyKey::Finales => self.finales,
            StrategyKey::Lstm => self.lstm,
        }
    }

    pub fn set(&mut self, key: StrategyKey, value: f64) {
        match key {
            StrategyKey::Hot => self.hot = value,
            StrategyKey::Due => self.due = value,
            StrategyKey::Correlation => self.correlation = value,
            StrategyKey::Position => self.position = value,
            StrategyKey::Balanced => self.balanced = value,
            StrategyKey::Statistical => self.statistical = value,
            StrategyKey::Finales => self.finales = value,
            StrategyKey::Lstm => self.lstm = value,
        }
    }

    pub fn sum(&self) -> f64 {
        StrategyKey::ALL.iter().map(|&k| self.get(k)).sum()
    }

    /// Borne chaque poids à [0.05, 0.60] puis normalise en L1. La
    /// normalisation peut ressortir un poids de sa plage : le résidu
    /// est alors réparti à parts égales sur les poids qui ont de la
    /// marge, jusqu'à saturation.
    pub fn clamp_normalize(&mut self) {
        for key in StrategyKey::ALL {
            self.set(key, self.get(key).clamp(WEIGHT_MIN, WEIGHT_MAX));
        }
        let sum = self.sum();
        if sum > 0.0 {
            for key in StrategyKey::ALL {
                self.set(key, self.get(key) / sum);
            }
        }
        for _ in 0..16 {
            for key in StrategyKey::ALL {
                self.set(key, self.get(key).clamp(WEIGHT_MIN, WEIGHT_MAX));
            }
            let residual = 1.0 - self.sum();
            if residual.abs() < 1e-12 {
                return;
            }
            let adjustable: Vec<StrategyKey> = StrategyKey::ALL
                .into_iter()
                .filter(|&k| {
                    let v = self.get(k);
                    (residual > 0.0 && v < WEIGHT_MAX - 1e-12)
                        || (residual < 0.0 && v > WEIGHT_MIN + 1e-12)
                })
                .collect();
            if adjustable.is_empty() {
                return;
            }
            let share = residual / adjustable.len() as f64;
            for key in adjustable {
                self.set(key, self.get(key) + share);
            }
        }
    }

    /// Arrondit à 2 décimales puis résorbe le résidu sur le poids le
    /// plus fort qui garde de la marge, pour une somme exacte de 1.
    pub fn round2(&mut self) {
        for key in StrategyKey::ALL {
            self.set(key, (self.get(key) * 100.0).round() / 100.0);
        }
        let residual = 1.0 - self.sum();
        if residual.abs() > 1e-9 {
            let carrier = StrategyKey::ALL
                .into_iter()
                .filter(|&k| {
                    let v = self.get(k) + residual;
                    (WEIGHT_MIN..=WEIGHT_MAX).contains(&v)
                })
                .max_by(|&a, &b| {
                    self.get(a)
                        .partial_cmp(&self.get(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(key) = carrier {
                self.set(key, self.get(key) + residual);
            }
        }
    }

    /// Construit depuis une table à clés dynamiques. Retourne aussi un
    /// indicateur « des clés par défaut ont été injectées ».
    pub fn from_map(
        map: &std::collections::BTreeMap<String, f64>,
    ) -> Result<(Self, bool), crate::error::EngineError> {
        for key in map.keys() {
            if StrategyKey::from_str(key).is_none() {
                return Err(crate::error::EngineError::InvalidInput(format!(
                    "clé de stratégie inconnue : {key}"
                )));
            }
        }
        let defaults = Self::default();
        let mut weights = Self::default();
        let mut injected = false;
        for key in StrategyKey::ALL {
            match map.get(key.as_str()) {
                Some(&v) => weights.set(key, v),
                None => {
                    weights.set(key, defaults.get(key));
                    injected = true;
                }
            }
        }
        Ok((weights, injected))
    }

    pub fn to_map(&self) -> std::collections::BTreeMap<String, f64> {
        StrategyKey::ALL
            .iter()
            .map(|&k| (k.as_str().to_string(), self.get(k)))
            .collect()
    }
}

/// Les huit stratégies pondérées, dans l'ordre canonique de combinaison.
pub fn all_strategies(ml: Arc<dyn MlSource>) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(hot::HotStrategy),
        Box::new(due::DueStrategy),
        Box::new(position::PositionStrategy),
        Box::new(correlation::CorrelationStrategy),
        Box::new(balanced::BalancedStrategy),
        Box::new(statistical::StatisticalStrategy),
        Box::new(finales::FinalesStrategy),
        Box::new(ml::MlStrategy::new(ml)),
    ]
}
