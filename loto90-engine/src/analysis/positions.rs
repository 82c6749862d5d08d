use loto90_db::models::{PICK_COUNT, POOL_SIZE};

/// Fréquences positionnelles : chaque tirage est trié en ordre croissant
/// avant d'accumuler les comptes par position.
#[derive(Debug, Clone)]
pub struct PositionStats {
    counts: [[u32; POOL_SIZE]; PICK_COUNT],
}

impl PositionStats {
    /// Les `k` numéros les plus fréquents à la position donnée (0..5),
    /// égalités départagées par numéro croissant.
    pub fn top(&self, position: usize, k: usize) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = self.counts[position]
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| ((i + 1) as u8, c))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

pub fn position_analysis(sets: &[[u8; 5]]) -> PositionStats {
    let mut counts = [[0u32; POOL_SIZE]; PICK_COUNT];
    for set in sets {
        let mut sorted = *set;
        sorted.sort_unstable();
        for (pos, &n) in sorted.iter().enumerate() {
            if (1..=POOL_SIZE as u8).contains(&n) {
                counts[pos][(n - 1) as usize] += 1;
            }
        }
    }
    PositionStats { counts }
}
