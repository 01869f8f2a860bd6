// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal : événements et rendu du graphique
// ============================================================================

pub mod chart;  // Rendu de l'écran
pub mod events; // Clavier, souris, ticks

pub use chart::render;
pub use events::{Event, EventHandler};
