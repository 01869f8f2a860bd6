// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application
//
// - range : période affichée (1D, 1W, ..., MAX)
// - price : série brute renvoyée par le fetch
// - chart_view_data : données de présentation prêtes à dessiner
// ============================================================================

pub mod chart_view_data;
pub mod price;
pub mod range;

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use tickerchart::models::range::ChartRange;
// On peut faire : use tickerchart::models::ChartRange;
pub use chart_view_data::{
    index_key, value_key, ChartAxisData, ChartViewData, ChartViewItem, LineColor,
};
pub use price::{PriceSample, PriceSeries};
pub use range::ChartRange;
