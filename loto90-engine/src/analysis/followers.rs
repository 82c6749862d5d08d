use std::collections::HashMap;

use loto90_db::models::POOL_SIZE;

/// Numéro suiveur d'une ancre : apparu au tirage suivant une apparition
/// de l'ancre.
#[derive(Debug, Clone)]
pub struct Follower {
    pub number: u8,
    pub count: u32,
    pub probability: f64,
}

const MIN_FOLLOWER_COUNT: u32 = 3;
const MIN_PROBABILITY: f64 = 0.10;
const TOP_PER_ANCHOR: usize = 10;

/// P(suiveur | ancre) = co-occurrences consécutives / fréquence de
/// l'ancre parmi les tirages ayant un successeur. Conserve les suiveurs
/// avec count ≥ 3 et P > 0.10, les 10 meilleurs par ancre.
pub fn follower_analysis(sets: &[[u8; 5]]) -> HashMap<u8, Vec<Follower>> {
    let mut result = HashMap::new();
    if sets.len() < 2 {
        return result;
    }

    let mut anchor_freq = [0u32; POOL_SIZE];
    let mut counts: HashMap<(u8, u8), u32> = HashMap::new();

    for window in sets.windows(2) {
        let (anchor_set, follower_set) = (&window[0], &window[1]);
        for &a in anchor_set {
            anchor_freq[(a - 1) as usize] += 1;
            for &f in follower_set {
                *counts.entry((a, f)).or_insert(0) += 1;
            }
        }
    }

    let mut per_anchor: HashMap<u8, Vec<Follower>> = HashMap::new();
    for ((a, f), count) in counts {
        let freq = anchor_freq[(a - 1) as usize];
        if freq == 0 {
            continue;
        }
        let probability = count as f64 / freq as f64;
        if count >= MIN_FOLLOWER_COUNT && probability > MIN_PROBABILITY {
            per_anchor.entry(a).or_default().push(Follower {
                number: f,
                count,
                probability,
            });
        }
    }

    for (anchor, mut followers) in per_anchor {
        followers.sort_by(|x, y| {
            y.probability
                .partial_cmp(&x.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(y.count.cmp(&x.count))
                .then(x.number.cmp(&y.number))
        });
        followers.truncate(TOP_PER_ANCHOR);
        result.insert(anchor, followers);
    }

    result
}
