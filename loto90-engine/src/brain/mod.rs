//! Mémoire d'apprentissage par volet : poids courants des stratégies,
//! statistiques cumulées et historique borné. Une seule écriture par
//! volet à la fois ; la copie durable vit dans `ai_memory`.

pub mod learn;

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use loto90_db::db;
use loto90_db::models::Stream;
use loto90_db::store::DrawStore;

use crate::error::EngineError;

pub const HISTORY_CAP: usize = 50;
pub const BRAIN_VERSION: u32 = 3;

pub use crate::strategies::{StrategyWeights, WEIGHT_MAX, WEIGHT_MIN};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub total_draws: u64,
    pub total_hits: u64,
    pub global_accuracy: f64,
}

impl StreamStats {
    /// Enregistre un tirage appris et ses `hits` numéros exacts.
    pub fn record(&mut self, hits: u8) {
        self.total_draws += 1;
        self.total_hits += hits as u64;
        self.global_accuracy = self.total_hits as f64 / (self.total_draws as f64 * 5.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrainStats {
    pub global: StreamStats,
    #[serde(default)]
    pub by_type: BTreeMap<i64, StreamStats>,
}

/// Entrée de l'historique d'apprentissage (FIFO borné à 50).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnRecord {
    pub date: NaiveDateTime,
    pub draw: Vec<u8>,
    pub strat_scores: BTreeMap<String, f64>,
    pub global_match: u8,
    pub new_weights: BTreeMap<String, f64>,
}

/// Dernier tirage utilisé pour l'apprentissage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSignature {
    pub date: NaiveDateTime,
    pub numbers: [u8; 5],
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrainBlob {
    version: u32,
    last_tuned: Option<NaiveDateTime>,
    weights: BTreeMap<String, f64>,
    stats: BrainStats,
    history: Vec<LearnRecord>,
    last_analyzed_draw: Option<DrawSignature>,
}

#[derive(Debug, Clone)]
pub struct Brain {
    pub version: u32,
    pub last_tuned: Option<NaiveDateTime>,
    pub weights: StrategyWeights,
    pub stats: BrainStats,
    pub history: VecDeque<LearnRecord>,
    pub last_analyzed_draw: Option<DrawSignature>,
}

impl Default for Brain {
    fn default() -> Self {
        Self {
            version: BRAIN_VERSION,
            last_tuned: None,
            weights: StrategyWeights::default(),
            stats: BrainStats::default(),
            history: VecDeque::new(),
            last_analyzed_draw: None,
        }
    }
}

impl Brain {
    /// Copie profonde de l'état courant.
    pub fn status(&self) -> Brain {
        self.clone()
    }

    /// Carte de scores de l'ensemble avec les poids courants. Mince
    /// enrobage du scoreur, partagé par le chemin serveur et
    /// l'apprentissage.
    pub fn score(
        &self,
        draws: &[loto90_db::models::Draw],
        stream: Stream,
        strategies: &[Box<dyn crate::strategies::Strategy>],
    ) -> crate::scorer::ScoreMap {
        crate::scorer::ensemble_scores(draws, &self.weights, stream, strategies)
    }

    /// Désérialise un blob. Retourne aussi un indicateur « migré » :
    /// des clés de poids manquantes ont été injectées puis l'ensemble
    /// renormalisé (arrondi à 2 décimales).
    pub fn from_json(data: &str) -> Result<(Brain, bool), EngineError> {
        let blob: BrainBlob = serde_json::from_str(data)
            .map_err(|e| EngineError::InvalidInput(format!("blob cerveau illisible : {e}")))?;
        let (mut weights, injected) = StrategyWeights::from_map(&blob.weights)?;
        if injected {
            weights.clamp_normalize();
            weights.round2();
        }
        let mut history: VecDeque<LearnRecord> = blob.history.into();
        while history.len() > HISTORY_CAP {
            history.pop_front();
        }
        Ok((
            Brain {
                version: blob.version,
                last_tuned: blob.last_tuned,
                weights,
                stats: blob.stats,
                history,
                last_analyzed_draw: blob.last_analyzed_draw,
            },
            injected,
        ))
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        let blob = BrainBlob {
            version: self.version,
            last_tuned: self.last_tuned,
            weights: self.weights.to_map(),
            stats: self.stats.clone(),
            history: self.history.iter().cloned().collect(),
            last_analyzed_draw: self.last_analyzed_draw.clone(),
        };
        serde_json::to_string(&blob)
            .map_err(|e| EngineError::Internal(format!("sérialisation du cerveau : {e}")))
    }

    /// Charge le cerveau d'un volet ; blob absent ou corrompu → état
    /// par défaut, avec avertissement.
    pub fn load(store: &dyn MemoryStore, stream: Stream) -> Brain {
        match store.load_brain(stream) {
            Some(data) => match Brain::from_json(&data) {
                Ok((brain, _)) => brain,
                Err(e) => {
                    warn!(volet = %stream, "cerveau corrompu, retour aux défauts : {e}");
                    Brain::default()
                }
            },
            None => Brain::default(),
        }
    }

    /// Persiste l'état. Un échec garde la copie mémoire et se borne à
    /// un avertissement.
    pub fn persist(&self, store: &dyn MemoryStore, stream: Stream) {
        let json = match self.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(volet = %stream, "sérialisation impossible : {e}");
                return;
            }
        };
        if let Err(e) = store.save_brain(stream, &json) {
            warn!(volet = %stream, "persistance du cerveau impossible : {e:#}");
        }
    }
}

/// Copie durable des cerveaux.
pub trait MemoryStore: Send + Sync {
    fn load_brain(&self, stream: Stream) -> Option<String>;
    fn save_brain(&self, stream: Stream, data: &str) -> anyhow::Result<()>;
}

impl MemoryStore for DrawStore {
    fn load_brain(&self, stream: Stream) -> Option<String> {
        self.with_conn(|conn| db::ai_memory_get(conn, stream.key()))
            .unwrap_or_else(|e| {
                warn!(volet = %stream, "lecture de la mémoire impossible : {e:#}");
                None
            })
    }

    fn save_brain(&self, stream: Stream, data: &str) -> anyhow::Result<()> {
        let now = chrono::Utc::now().naive_utc();
        self.with_conn(|conn| db::ai_memory_put(conn, stream.key(), data, now))
    }
}

/// Mémoire volatile pour les tests.
#[derive(Default)]
pub struct InMemoryStore {
    blobs: parking_lot::Mutex<BTreeMap<&'static str, String>>,
}

impl MemoryStore for InMemoryStore {
    fn load_brain(&self, stream: Stream) -> Option<String> {
        self.blobs.lock().get(stream.key()).cloned()
    }

    fn save_brain(&self, stream: Stream, data: &str) -> anyhow::Result<()> {
        self.blobs.lock().insert(stream.key(), data.to_string());
        Ok(())
    }
}
