use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::warn;

use crate::db;
use crate::models::{Draw, DrawType};

/// Nombre maximal de tirages retournés sans filtre de type.
const GLOBAL_LIMIT: u32 = 5000;
const DRAWS_TTL: Duration = Duration::from_secs(3600);

struct CachedDraws {
    draws: Vec<Draw>,
    fetched_at: Instant,
}

/// Adaptateur de lecture au-dessus de la base.
///
/// Les erreurs de la base ne remontent jamais aux appelants : une lecture
/// en échec retourne une séquence vide et journalise un avertissement.
/// La liste globale est mise en cache 1 h ; `invalidate` force le
/// rafraîchissement au prochain accès.
pub struct DrawStore {
    conn: Mutex<Connection>,
    draws_cache: Mutex<Option<CachedDraws>>,
    types_cache: Mutex<Option<Vec<DrawType>>>,
}

impl DrawStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            draws_cache: Mutex::new(None),
            types_cache: Mutex::new(None),
        }
    }

    /// Tirages en ordre chronologique (plus ancien d'abord).
    ///
    /// Sans filtre : les 5000 tirages les plus récents, tous types
    /// confondus. Avec filtre : l'historique complet du type, sans cache.
    pub fn get_draws(&self, draw_type_id: Option<i64>) -> Vec<Draw> {
        match draw_type_id {
            Some(type_id) => {
                let conn = self.conn.lock();
                match db::fetch_draws_for_type(&conn, type_id) {
                    Ok(draws) => draws,
                    Err(e) => {
                        warn!(type_id, "lecture des tirages impossible : {e:#}");
                        Vec::new()
                    }
                }
            }
            None => {
                {
                    let cache = self.draws_cache.lock();
                    if let Some(cached) = cache.as_ref() {
                        if cached.fetched_at.elapsed() < DRAWS_TTL {
                            return cached.draws.clone();
                        }
                    }
                }
                let fetched = {
                    let conn = self.conn.lock();
                    db::fetch_recent_draws(&conn, GLOBAL_LIMIT)
                };
                match fetched {
                    Ok(mut draws) => {
                        // La requête renvoie du plus récent au plus ancien.
                        draws.reverse();
                        *self.draws_cache.lock() = Some(CachedDraws {
                            draws: draws.clone(),
                            fetched_at: Instant::now(),
                        });
                        draws
                    }
                    Err(e) => {
                        warn!("lecture des tirages impossible : {e:#}");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Catalogue des types de tirage, mis en cache indéfiniment.
    pub fn get_draw_types(&self) -> Vec<DrawType> {
        {
            let cache = self.types_cache.lock();
            if let Some(types) = cache.as_ref() {
                return types.clone();
            }
        }
        let fetched = {
            let conn = self.conn.lock();
            db::list_draw_types(&conn)
        };
        match fetched {
            Ok(types) => {
                *self.types_cache.lock() = Some(types.clone());
                types
            }
            Err(e) => {
                warn!("lecture des types de tirage impossible : {e:#}");
                Vec::new()
            }
        }
    }

    /// Signal « nouvelles données » : vide le cache des tirages.
    pub fn invalidate(&self) {
        *self.draws_cache.lock() = None;
        *self.types_cache.lock() = None;
    }

    /// Accès direct à la connexion pour les écritures (import, mémoire,
    /// motifs). Les chemins de lecture passent par `get_draws`.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store_with_draws() -> DrawStore {
        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();
        let type_id = db::get_or_create_draw_type(&conn, "Fortune", "midi").unwrap();
        for day in 1..=5 {
            let date = NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let base = day as u8;
            db::insert_draw(
                &conn,
                type_id,
                date,
                &[base, base + 10, base + 20, base + 30, base + 40],
                None,
            )
            .unwrap();
        }
        DrawStore::new(conn)
    }

    #[test]
    fn test_get_draws_chronological() {
        let store = store_with_draws();
        let draws = store.get_draws(None);
        assert_eq!(draws.len(), 5);
        assert!(draws[0].date < draws[4].date);
    }

    #[test]
    fn test_get_draws_filtered() {
        let store = store_with_draws();
        let types = store.get_draw_types();
        assert_eq!(types.len(), 1);
        let draws = store.get_draws(Some(types[0].id));
        assert_eq!(draws.len(), 5);
        let none = store.get_draws(Some(9999));
        assert!(none.is_empty());
    }

    #[test]
    fn test_cache_serves_stale_until_invalidated() {
        let store = store_with_draws();
        let before = store.get_draws(None);
        store
            .with_conn(|conn| {
                let date = NaiveDate::from_ymd_opt(2024, 2, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap();
                db::insert_draw(conn, 1, date, &[50, 51, 52, 53, 54], None)?;
                Ok(())
            })
            .unwrap();
        // Le cache n'a pas expiré : snapshot identique.
        assert_eq!(store.get_draws(None).len(), before.len());
        store.invalidate();
        assert_eq!(store.get_draws(None).len(), before.len() + 1);
    }
}
