// ============================================================================
// TickerChart - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;        // API Yahoo Finance
pub mod app;        // État de l'écran
pub mod chart_data; // Transformer, axes et résolution du drag
pub mod config;     // Configuration (env, .env, arguments)
pub mod models;     // Structures de données
pub mod ui;         // Interface utilisateur
