//! Mémoïsation courte des prédictions, par (type de tirage, jour).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const PREDICTION_TTL: Duration = Duration::from_secs(600);

/// Clé : type de tirage (ou « tous ») et jour de semaine (ou « tous »).
pub type CacheKey = (Option<i64>, Option<u8>);

struct Slot<T> {
    value: T,
    inserted_at: Instant,
}

pub struct PredictionCache<T> {
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Slot<T>>>,
}

impl<T: Clone> PredictionCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Valeur fraîche et son âge en secondes, si présente.
    pub fn get(&self, key: &CacheKey) -> Option<(T, u64)> {
        let slots = self.slots.lock();
        let slot = slots.get(key)?;
        let age = slot.inserted_at.elapsed();
        if age < self.ttl {
            Some((slot.value.clone(), age.as_secs()))
        } else {
            None
        }
    }

    pub fn put(&self, key: CacheKey, value: T) {
        self.slots.lock().insert(
            key,
            Slot {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Signal « nouvelles données » : tout est invalidé.
    pub fn invalidate_all(&self) {
        self.slots.lock().clear();
    }
}

impl<T: Clone> Default for PredictionCache<T> {
    fn default() -> Self {
        Self::new(PREDICTION_TTL)
    }
}
