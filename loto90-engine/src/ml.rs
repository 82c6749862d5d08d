use loto90_db::models::Draw;

/// Source de candidats externe (module d'apprentissage profond hors du
/// moteur). Le moteur fonctionne à l'identique quand elle est vide.
pub trait MlSource: Send + Sync {
    /// Liste ordonnée d'au plus `k` numéros candidats pour la séquence
    /// chronologique donnée.
    fn rank(&self, draws: &[Draw], k: usize) -> Vec<u8>;
}

/// Source absente : aucun candidat.
pub struct NullMlSource;

impl MlSource for NullMlSource {
    fn rank(&self, _draws: &[Draw], _k: usize) -> Vec<u8> {
        Vec::new()
    }
}

/// Liste figée, pour les tests et le rejeu.
pub struct FixedMlSource(pub Vec<u8>);

impl MlSource for FixedMlSource {
    fn rank(&self, _draws: &[Draw], k: usize) -> Vec<u8> {
        self.0.iter().copied().take(k).collect()
    }
}
