/// Analyse des finales : regroupement des numéros par dernier chiffre.
#[derive(Debug, Clone)]
pub struct FinaleStats {
    pub finale: u8,
    /// Occurrences totales de numéros portant cette finale.
    pub count: u32,
    /// Tirages distincts contenant la finale.
    pub appearances: u32,
    /// Tirages écoulés depuis la dernière apparition.
    pub current_gap: u32,
    /// Analogue au dueScore des cycles : min(200, 100 · gap / cycle moyen).
    pub due_score: f64,
    /// Part des occurrences sur l'ensemble des numéros tirés.
    pub percentage: f64,
}

pub fn finale_analysis(sets: &[[u8; 5]]) -> Vec<FinaleStats> {
    let n_draws = sets.len();
    let total_numbers = (n_draws * 5) as f64;

    let mut counts = [0u32; 10];
    let mut appearance_idx: Vec<Vec<usize>> = vec![Vec::new(); 10];

    for (t, set) in sets.iter().enumerate() {
        let mut seen = [false; 10];
        for &n in set {
            let f = (n % 10) as usize;
            counts[f] += 1;
            if !seen[f] {
                seen[f] = true;
                appearance_idx[f].push(t);
            }
        }
    }

    (0..10u8)
        .map(|finale| {
            let idx = &appearance_idx[finale as usize];
            let count = counts[finale as usize];

            let (current_gap, due_score, appearances) = if idx.is_empty() {
                (n_draws as u32, 200.0, 0)
            } else {
                let gaps: Vec<f64> = idx.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
                let current_gap = (n_draws - 1 - idx[idx.len() - 1]) as u32;
                let due = if gaps.is_empty() {
                    0.0
                } else {
                    let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
                    if avg > 0.0 {
                        (100.0 * current_gap as f64 / avg).min(200.0)
                    } else {
                        0.0
                    }
                };
                (current_gap, due, idx.len() as u32)
            };

            let percentage = if total_numbers > 0.0 {
                100.0 * count as f64 / total_numbers
            } else {
                0.0
            };

            FinaleStats {
                finale,
                count,
                appearances,
                current_gap,
                due_score,
                percentage,
            }
        })
        .collect()
}
