//! Sélection de 5 numéros sous contrainte d'équilibre par dizaine.

use loto90_db::models::{PICK_COUNT, POOL_SIZE};

use crate::scorer::ScoreMap;

/// Dizaine du sélecteur : ⌊(n−1)/10⌋, le panier 8 couvre 81..90.
pub fn selector_decade(n: u8) -> usize {
    ((n - 1) / 10) as usize
}

const MAX_PER_DECADE: usize = 2;

/// Passe gloutonne sur les candidats par score décroissant : un
/// candidat est accepté si sa dizaine compte moins de 2 retenus. Une
/// seconde passe complète sans contrainte si besoin. Résultat trié
/// croissant ; carte vide → sélection vide.
pub fn select_numbers(map: &ScoreMap) -> Vec<u8> {
    let candidates = map.top(POOL_SIZE);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut per_decade = [0usize; 9];
    let mut selected: Vec<u8> = Vec::with_capacity(PICK_COUNT);

    for &(n, _) in &candidates {
        if selected.len() >= PICK_COUNT {
            break;
        }
        let d = selector_decade(n);
        if per_decade[d] < MAX_PER_DECADE {
            per_decade[d] += 1;
            selected.push(n);
        }
    }

    if selected.len() < PICK_COUNT {
        for &(n, _) in &candidates {
            if selected.len() >= PICK_COUNT {
                break;
            }
            if !selected.contains(&n) {
                selected.push(n);
            }
        }
    }

    selected.sort_unstable();
    selected
}

/// Confiance = min(95, moyenne des scores retenus · 100 + 40).
pub fn confidence(map: &ScoreMap, selection: &[u8]) -> f64 {
    confidence_with(map, selection, 95.0, 40.0)
}

/// Variante hybride : plafond 97, base 42.
pub fn hybrid_confidence(map: &ScoreMap, selection: &[u8]) -> f64 {
    confidence_with(map, selection, 97.0, 42.0)
}

fn confidence_with(map: &ScoreMap, selection: &[u8], cap: f64, base: f64) -> f64 {
    if selection.is_empty() {
        return 0.0;
    }
    let avg = selection.iter().map(|&n| map.score_of(n)).sum::<f64>() / selection.len() as f64;
    (avg * 100.0 + base).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(scores: &[(u8, f64)]) -> ScoreMap {
        let mut map = ScoreMap::empty();
        for &(n, s) in scores {
            map.scores[(n - 1) as usize] = s;
        }
        map
    }

    #[test]
    fn test_exactly_five_distinct_sorted() {
        let map = map_with(&[
            (3, 5.0),
            (17, 4.0),
            (29, 3.5),
            (44, 3.0),
            (58, 2.5),
            (71, 2.0),
        ]);
        let sel = select_numbers(&map);
        assert_eq!(sel.len(), 5);
        assert!(sel.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_decade_constraint() {
        // Cinq scores massifs dans la dizaine 10..19 : deux seulement
        // passent la première passe.
        let map = map_with(&[
            (11, 9.0),
            (12, 8.0),
            (13, 7.0),
            (14, 6.0),
            (15, 5.0),
            (31, 1.0),
            (52, 0.9),
            (73, 0.8),
        ]);
        let sel = select_numbers(&map);
        let in_teens = sel.iter().filter(|&&n| (11..=20).contains(&n)).count();
        assert_eq!(in_teens, 2);
        assert_eq!(sel, vec![11, 12, 31, 52, 73]);
    }

    #[test]
    fn test_second_pass_when_too_few_decades() {
        // Tous les scores vivent dans une seule dizaine : la seconde
        // passe complète quand même à 5.
        let map = map_with(&[(21, 5.0), (22, 4.0), (23, 3.0), (24, 2.0), (25, 1.0)]);
        let sel = select_numbers(&map);
        assert_eq!(sel, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_empty_map_empty_selection() {
        let map = ScoreMap::empty();
        let sel = select_numbers(&map);
        assert!(sel.is_empty());
        assert_eq!(confidence(&map, &sel), 0.0);
    }

    #[test]
    fn test_boundary_decades() {
        assert_eq!(selector_decade(1), 0);
        assert_eq!(selector_decade(10), 0);
        assert_eq!(selector_decade(11), 1);
        assert_eq!(selector_decade(80), 7);
        assert_eq!(selector_decade(81), 8);
        assert_eq!(selector_decade(90), 8);
    }

    #[test]
    fn test_confidence_capped() {
        let map = map_with(&[(1, 9.0), (20, 9.0), (40, 9.0), (60, 9.0), (80, 9.0)]);
        let sel = select_numbers(&map);
        assert_eq!(confidence(&map, &sel), 95.0);
        assert_eq!(hybrid_confidence(&map, &sel), 97.0);
    }

    #[test]
    fn test_confidence_formula() {
        let map = map_with(&[(1, 0.1), (20, 0.1), (40, 0.1), (60, 0.1), (80, 0.1)]);
        let sel = select_numbers(&map);
        assert!((confidence(&map, &sel) - 50.0).abs() < 1e-9);
        assert!((hybrid_confidence(&map, &sel) - 52.0).abs() < 1e-9);
    }
}
