// ============================================================================
// Erreurs du transformer
// ============================================================================
// CONCEPT RUST : thiserror
// - Enum d'erreurs typées que l'appelant peut matcher
// - #[error("...")] génère l'implémentation de Display
// - Se convertit en anyhow::Error avec ? côté application
// ============================================================================

use thiserror::Error;

/// Série d'entrée invalide : aucun graphique ne peut être dessiné
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// Aucun échantillon
    #[error("la série de prix est vide")]
    EmptySeries,

    /// Prix NaN ou infini
    #[error("prix non fini à l'index {index}")]
    NonFinitePrice { index: usize },

    /// Timestamp antérieur à celui de l'échantillon précédent
    #[error("timestamps non chronologiques à l'index {index}")]
    NonMonotonicTimestamps { index: usize },
}
