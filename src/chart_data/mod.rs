// ============================================================================
// Module : chart_data
// ============================================================================
// Coeur du graphique, sans dépendance à l'UI :
// - transformer : série brute → ChartViewData
// - axis : bornes, pas et labels des axes
// - drag : position du pointeur → index de point
// - error : DataError
// ============================================================================

pub mod axis;
pub mod drag;
pub mod error;
pub mod transformer;

pub use drag::{resolve, DragResolver, DragState, Gesture};
pub use error::DataError;
pub use transformer::ChartDataTransformer;
