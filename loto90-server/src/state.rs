//! État partagé du serveur : caches construits explicitement à
//! l'initialisation, détruits à l'arrêt. Pas de singletons cachés.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use loto90_db::models::{Draw, Stream};
use loto90_db::store::DrawStore;
use loto90_engine::brain::{learn::learn, Brain, MemoryStore};
use loto90_engine::cache::PredictionCache;
use loto90_engine::history::{FilePredictionLog, PredictionLog};
use loto90_engine::ml::NullMlSource;
use loto90_engine::predict::Prediction;
use loto90_engine::strategies::{all_strategies, Strategy};
use loto90_engine::verify::Verifier;

use crate::config::ServerConfig;

/// Cerveaux par volet. Un seul écrivain par volet à la fois (verrou en
/// écriture) ; les lecteurs prennent un instantané cohérent.
pub struct BrainCache {
    winning: RwLock<Brain>,
    machine: RwLock<Brain>,
}

impl BrainCache {
    pub fn load(store: &dyn MemoryStore) -> Self {
        Self {
            winning: RwLock::new(Brain::load(store, Stream::Winning)),
            machine: RwLock::new(Brain::load(store, Stream::Machine)),
        }
    }

    fn slot(&self, stream: Stream) -> &RwLock<Brain> {
        match stream {
            Stream::Winning => &self.winning,
            Stream::Machine => &self.machine,
        }
    }

    /// Instantané profond de l'état du volet.
    pub fn snapshot(&self, stream: Stream) -> Brain {
        self.slot(stream).read().status()
    }

    /// Apprentissage copie-puis-échange : le tirage n'est appris que
    /// s'il diffère du dernier analysé, puis l'état est persisté.
    pub fn learn_if_new(
        &self,
        stream: Stream,
        actual: &Draw,
        all_draws: &[Draw],
        draw_type_id: Option<i64>,
        strategies: &[Box<dyn Strategy>],
        store: &dyn MemoryStore,
        now: NaiveDateTime,
    ) -> bool {
        let Some(actual_set) = stream.numbers_from(actual) else {
            return false;
        };
        let already_learned = |brain: &Brain| {
            brain
                .last_analyzed_draw
                .as_ref()
                .is_some_and(|sig| sig.date == actual.date && sig.numbers == *actual_set)
        };

        let slot = self.slot(stream);
        let mut updated = {
            let guard = slot.read();
            if already_learned(&guard) {
                return false;
            }
            guard.clone()
        };

        // Copie puis échange : le calcul se fait hors verrou, l'échange
        // revérifie que personne n'a appris ce tirage entre-temps.
        let outcome = learn(
            &mut updated,
            actual,
            all_draws,
            draw_type_id,
            stream,
            strategies,
            now,
        );
        let Some(outcome) = outcome else {
            return false;
        };

        {
            let mut guard = slot.write();
            if already_learned(&guard) {
                return false;
            }
            *guard = updated.clone();
        }
        info!(
            volet = %stream,
            exacts = outcome.global_match,
            "apprentissage d'un nouveau tirage"
        );
        updated.persist(store, stream);
        true
    }
}

pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<DrawStore>,
    pub brains: BrainCache,
    pub prediction_cache: PredictionCache<Prediction>,
    pub log: Arc<dyn PredictionLog>,
    pub verifier: Verifier,
    pub strategies: Vec<Box<dyn Strategy>>,
    pub is_refreshing: AtomicBool,
    pub last_error: Mutex<Option<String>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig, store: DrawStore) -> SharedState {
        let store = Arc::new(store);
        let brains = BrainCache::load(store.as_ref());
        let log = Arc::new(FilePredictionLog::new(config.history_path.clone()));
        Arc::new(Self {
            config,
            store,
            brains,
            prediction_cache: PredictionCache::default(),
            log,
            verifier: Verifier::new(),
            strategies: all_strategies(Arc::new(NullMlSource)),
            is_refreshing: AtomicBool::new(false),
            last_error: Mutex::new(None),
        })
    }

    pub fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock() = message;
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
