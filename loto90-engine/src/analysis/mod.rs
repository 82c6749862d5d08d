//! Analyseurs statistiques : fonctions pures sur une séquence
//! chronologique de tirages (plus ancien d'abord).

pub mod correlations;
pub mod cycles;
pub mod decades;
pub mod finales;
pub mod followers;
pub mod positions;

use loto90_db::models::{Draw, Stream, POOL_SIZE};

/// Extrait la séquence des jeux de 5 numéros du volet demandé, en
/// ignorant les tirages où le volet est absent.
pub fn stream_history(draws: &[Draw], stream: Stream) -> Vec<[u8; 5]> {
    draws
        .iter()
        .filter_map(|d| stream.numbers_from(d).copied())
        .collect()
}

/// Fréquence brute de chaque numéro (index 0 = numéro 1).
pub fn number_frequencies(sets: &[[u8; 5]]) -> [u32; POOL_SIZE] {
    let mut freq = [0u32; POOL_SIZE];
    for set in sets {
        for &n in set {
            if (1..=POOL_SIZE as u8).contains(&n) {
                freq[(n - 1) as usize] += 1;
            }
        }
    }
    freq
}
