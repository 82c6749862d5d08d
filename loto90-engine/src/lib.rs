//! Moteur de prédiction : analyseurs statistiques, pool de stratégies,
//! combinaison d'ensemble, sélection équilibrée, amplification hybride,
//! mémoire d'apprentissage par volet et boucle de vérification.

pub mod analysis;
pub mod booster;
pub mod brain;
pub mod cache;
pub mod error;
pub mod evaluate;
pub mod history;
pub mod ml;
pub mod predict;
pub mod scorer;
pub mod selector;
pub mod strategies;
pub mod verify;

use chrono::Datelike;
use loto90_db::models::Draw;

/// Historique synthétique déterministe pour les tests : les numéros
/// suivent un motif périodique, chaque tirage porte un groupe machine.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(13, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let base = (i % 17) as u8;
            let mbase = ((i + 7) % 17) as u8;
            let date = start + chrono::Duration::days(i as i64);
            Draw {
                id: i as i64 + 1,
                draw_type_id: 1,
                date,
                day_of_week: date.weekday().num_days_from_sunday() as u8,
                winning: [
                    base * 5 + 1,
                    base * 5 + 2,
                    base * 5 + 3,
                    base * 5 + 4,
                    base * 5 + 5,
                ],
                machine: Some([
                    mbase * 5 + 1,
                    mbase * 5 + 2,
                    mbase * 5 + 3,
                    mbase * 5 + 4,
                    mbase * 5 + 5,
                ]),
            }
        })
        .collect()
}
