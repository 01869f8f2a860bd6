// ============================================================================
// Module : api
// ============================================================================
// Client de récupération des séries de prix
// ============================================================================

pub mod yahoo; // API chart Yahoo Finance

pub use yahoo::fetch_chart_series;
