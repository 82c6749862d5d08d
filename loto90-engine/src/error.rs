use thiserror::Error;

/// Erreurs du moteur de prédiction.
///
/// Les stratégies n'en produisent jamais : elles retournent des listes
/// vides. Les opérations du cerveau absorbent les échecs de persistance
/// et gardent la copie mémoire cohérente.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requête malformée (mauvais nombre de numéros, hors plage, doublons).
    #[error("entrée invalide : {0}")]
    InvalidInput(String),

    /// Dépendance indisponible ; le moteur dégrade sans panique.
    #[error("indisponible : {0}")]
    Unavailable(String),

    /// Erreur de programmation ou échec de persistance en écriture.
    #[error("erreur interne : {0}")]
    Internal(String),

    /// Un rafraîchissement est déjà en cours.
    #[error("conflit d'état : {0}")]
    StateConflict(String),
}
