use loto90_db::models::POOL_SIZE;

/// Statistiques de cycle d'un numéro, dérivées de ses indices
/// d'apparition chronologiques.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub number: u8,
    pub avg_cycle: f64,
    pub median_cycle: f64,
    pub min_cycle: u32,
    pub max_cycle: u32,
    pub std_dev: f64,
    /// Tirages écoulés depuis la dernière apparition.
    pub current_gap: u32,
    /// min(200, 100 · gap / cycle moyen) ; 200 si jamais apparu.
    pub due_score: f64,
    /// Nombre de cycles complets observés.
    pub cycle_count: u32,
    pub is_overdue: bool,
    pub overdue_by: f64,
}

/// Analyse de cycle pour chaque numéro 1..90.
/// `sets` est la séquence chronologique des jeux du volet.
pub fn cycle_analysis(sets: &[[u8; 5]]) -> Vec<CycleStats> {
    let n_draws = sets.len();
    let mut appearances: Vec<Vec<usize>> = vec![Vec::new(); POOL_SIZE];
    for (t, set) in sets.iter().enumerate() {
        for &n in set {
            if (1..=POOL_SIZE as u8).contains(&n) {
                appearances[(n - 1) as usize].push(t);
            }
        }
    }

    (0..POOL_SIZE)
        .map(|i| {
            let idx = &appearances[i];
            let number = (i + 1) as u8;

            if idx.is_empty() {
                return CycleStats {
                    number,
                    avg_cycle: 0.0,
                    median_cycle: 0.0,
                    min_cycle: 0,
                    max_cycle: 0,
                    std_dev: 0.0,
                    current_gap: n_draws as u32,
                    due_score: 200.0,
                    cycle_count: 0,
                    is_overdue: false,
                    overdue_by: 0.0,
                };
            }

            let mut gaps: Vec<u32> = idx.windows(2).map(|w| (w[1] - w[0]) as u32).collect();
            let current_gap = (n_draws - 1 - idx[idx.len() - 1]) as u32;
            let cycle_count = gaps.len() as u32;

            let (avg, median, min, max, std_dev) = if gaps.is_empty() {
                (0.0, 0.0, 0, 0, 0.0)
            } else {
                let avg = gaps.iter().map(|&g| g as f64).sum::<f64>() / gaps.len() as f64;
                gaps.sort_unstable();
                let median = gaps[gaps.len() / 2] as f64;
                let min = gaps[0];
                let max = gaps[gaps.len() - 1];
                let variance = gaps
                    .iter()
                    .map(|&g| (g as f64 - avg).powi(2))
                    .sum::<f64>()
                    / gaps.len() as f64;
                (avg, median, min, max, variance.sqrt())
            };

            let due_score = if avg > 0.0 {
                (100.0 * current_gap as f64 / avg).min(200.0)
            } else {
                0.0
            };

            let is_overdue = avg > 0.0 && (current_gap as f64) > avg;
            let overdue_by = if is_overdue {
                current_gap as f64 - avg
            } else {
                0.0
            };

            CycleStats {
                number,
                avg_cycle: avg,
                median_cycle: median,
                min_cycle: min,
                max_cycle: max,
                std_dev,
                current_gap,
                due_score,
                cycle_count,
                is_overdue,
                overdue_by,
            }
        })
        .collect()
}
