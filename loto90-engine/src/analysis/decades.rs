/// Répartition par dizaines : 1-9, 10-19, …, 70-79, 80-90
/// (le dernier panier couvre 11 numéros).
#[derive(Debug, Clone)]
pub struct DecadeStats {
    pub counts: [u32; 9],
    /// Motif par tirage : comptes par dizaine joints par des tirets.
    pub patterns: Vec<String>,
}

/// Panier d'analyse d'un numéro (distinct de la dizaine du sélecteur).
pub fn decade_of(n: u8) -> usize {
    ((n / 10) as usize).min(8)
}

pub fn decade_analysis(sets: &[[u8; 5]]) -> DecadeStats {
    let mut counts = [0u32; 9];
    let mut patterns = Vec::with_capacity(sets.len());
    for set in sets {
        let mut per_draw = [0u32; 9];
        for &n in set {
            per_draw[decade_of(n)] += 1;
        }
        for (total, c) in counts.iter_mut().zip(per_draw.iter()) {
            *total += c;
        }
        patterns.push(
            per_draw
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("-"),
        );
    }
    DecadeStats { counts, patterns }
}
