//! Journal des prédictions servies : un fichier JSON, entrées les plus
//! récentes d'abord, borné à 1000. La boucle de vérification le relit
//! pour rapprocher prédictions et tirages observés.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub const HISTORY_FILE_CAP: usize = 1000;

/// Résultat d'un rapprochement avec un tirage réel. Une fois posé,
/// jamais réécrit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedResult {
    pub draw_date: NaiveDateTime,
    pub actual: Vec<u8>,
    pub match_count: u8,
    pub matches: Vec<u8>,
    pub near_misses: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub timestamp: NaiveDateTime,
    pub draw_type_id: Option<i64>,
    pub day_of_week: Option<u8>,
    pub predicted_numbers: Vec<u8>,
    pub confidence: f64,
    pub scores: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_numbers: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_numbers: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<VerifiedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_result: Option<VerifiedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_result: Option<VerifiedResult>,
}

impl PredictionRecord {
    pub fn is_verified(&self) -> bool {
        self.result.is_some()
    }
}

/// Journal des prédictions. Le fichier est le support nominal ; les
/// tests substituent la variante en mémoire.
pub trait PredictionLog: Send + Sync {
    /// Ajoute en tête (plus récent d'abord) et tronque à 1000.
    fn append(&self, record: PredictionRecord) -> Result<()>;
    fn entries(&self) -> Vec<PredictionRecord>;
    /// Remplace le contenu entier (mises à jour de vérification).
    fn replace(&self, entries: Vec<PredictionRecord>) -> Result<()>;
}

pub struct FilePredictionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePredictionLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Vec<PredictionRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("journal des prédictions illisible : {e}");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    fn write(&self, entries: &[PredictionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", self.path))?;
        Ok(())
    }
}

impl PredictionLog for FilePredictionLog {
    fn append(&self, record: PredictionRecord) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read();
        entries.insert(0, record);
        entries.truncate(HISTORY_FILE_CAP);
        self.write(&entries)
    }

    fn entries(&self) -> Vec<PredictionRecord> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn replace(&self, mut entries: Vec<PredictionRecord>) -> Result<()> {
        let _guard = self.lock.lock();
        entries.truncate(HISTORY_FILE_CAP);
        self.write(&entries)
    }
}

/// Journal volatile pour les tests.
#[derive(Default)]
pub struct InMemoryPredictionLog {
    entries: Mutex<Vec<PredictionRecord>>,
}

impl PredictionLog for InMemoryPredictionLog {
    fn append(&self, record: PredictionRecord) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(0, record);
        entries.truncate(HISTORY_FILE_CAP);
        Ok(())
    }

    fn entries(&self) -> Vec<PredictionRecord> {
        self.entries.lock().clone()
    }

    fn replace(&self, mut entries: Vec<PredictionRecord>) -> Result<()> {
        entries.truncate(HISTORY_FILE_CAP);
        *self.entries.lock() = entries;
        Ok(())
    }
}
