// ============================================================================
// Structure : App
// ============================================================================
// État de l'écran graphique (rôle de view model) :
// - ticker et période sélectionnés
// - phase de chargement et dernière ChartViewData
// - état du drag
// - numérotation des requêtes (la dernière requête gagne)
//
// PATTERN : "Application State"
// - Le rendu lit App (&App)
// - Les événements et les résultats du worker modifient App (&mut App)
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::chart_data::{ChartDataTransformer, DragResolver, DragState, Gesture};
use crate::config::Config;
use crate::models::{ChartRange, ChartViewData, ChartViewItem, PriceSeries};

// ============================================================================
// Enum : FetchPhase
// ============================================================================

/// Phase de chargement du graphique
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPhase {
    /// Rien n'a encore été demandé
    Initial,

    /// Chargement en cours, pas de graphique à afficher
    Fetching,

    /// Graphique prêt
    Success(ChartViewData),

    /// Données reçues mais inutilisables (série vide ou invalide)
    Empty,

    /// Échec du fetch (message pour l'utilisateur)
    Failure(String),
}

/// Requête de chargement à envoyer au worker
///
/// `id` croît à chaque requête : seul le résultat portant le dernier id
/// est appliqué.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub id: u64,
    pub symbol: String,
    pub range: ChartRange,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Ticker affiché
    pub symbol: String,

    /// Période sélectionnée
    pub selected_range: ChartRange,

    /// Phase de chargement courante
    pub phase: FetchPhase,

    /// État du drag (point sélectionné)
    pub drag: DragState,

    /// Clôture précédente de la dernière série reçue (en-tête)
    pub previous_close: Option<f64>,

    /// Un rafraîchissement est en cours alors qu'un graphique est affiché
    pub is_refreshing: bool,

    /// Two-step quit : première pression de 'q' → confirmation
    pub confirm_quit: bool,

    /// Rafraîchissement automatique (None = désactivé)
    refresh_interval: Option<Duration>,

    /// Dernier id de requête émis
    latest_request_id: u64,

    /// Requête dont on attend encore le résultat
    pending_request_id: Option<u64>,

    /// Instant de la dernière requête émise
    last_request_at: Option<Instant>,
}

impl App {
    /// Crée l'état initial depuis la configuration
    pub fn new(config: &Config) -> Self {
        Self {
            running: true,
            symbol: config.symbol.clone(),
            selected_range: config.range,
            phase: FetchPhase::Initial,
            drag: DragState::Idle,
            previous_close: None,
            is_refreshing: false,
            confirm_quit: false,
            refresh_interval: config.refresh_interval,
            latest_request_id: 0,
            pending_request_id: None,
            last_request_at: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Requêtes
    // ========================================================================

    /// Émet une requête pour la période courante
    ///
    /// Le graphique affiché est conservé (rafraîchissement en arrière-plan)
    /// s'il correspond déjà à cette période.
    pub fn request_chart(&mut self, now: Instant) -> ChartRequest {
        self.latest_request_id += 1;
        self.pending_request_id = Some(self.latest_request_id);
        self.last_request_at = Some(now);

        match self.phase {
            FetchPhase::Success(_) => self.is_refreshing = true,
            _ => self.phase = FetchPhase::Fetching,
        }

        let request = ChartRequest {
            id: self.latest_request_id,
            symbol: self.symbol.clone(),
            range: self.selected_range,
        };
        debug!(id = request.id, range = %request.range, "Issued chart request");
        request
    }

    /// Change de période et émet la requête correspondante
    ///
    /// L'ancien graphique (autre période) n'est plus affiché.
    pub fn select_range(&mut self, range: ChartRange, now: Instant) -> ChartRequest {
        self.selected_range = range;
        self.phase = FetchPhase::Fetching;
        self.is_refreshing = false;
        self.drag.reset();
        info!(range = %range, "Selected chart range");
        self.request_chart(now)
    }

    pub fn next_range(&mut self, now: Instant) -> ChartRequest {
        self.select_range(self.selected_range.next(), now)
    }

    pub fn previous_range(&mut self, now: Instant) -> ChartRequest {
        self.select_range(self.selected_range.previous(), now)
    }

    /// Applique le résultat d'une requête
    ///
    /// CONCEPT : Last-request-wins
    /// - Un résultat dont l'id n'est pas le dernier émis est ignoré
    /// - Retourne true si le résultat a été appliqué
    pub fn apply_fetch_result(&mut self, request_id: u64, result: Result<PriceSeries, String>) -> bool {
        if request_id != self.latest_request_id {
            debug!(
                request_id,
                latest = self.latest_request_id,
                "Discarding stale chart result"
            );
            return false;
        }

        self.pending_request_id = None;
        self.is_refreshing = false;

        match result {
            Ok(series) => {
                self.previous_close = series.previous_close;
                let transformer = ChartDataTransformer::for_series(&series);

                match transformer.transform_series(&series) {
                    Ok(data) => {
                        info!(items = data.len(), range = %self.selected_range, "Chart updated");
                        self.drag.clamp(data.len());
                        self.phase = FetchPhase::Success(data);
                    }
                    Err(e) => {
                        warn!(error = %e, symbol = %series.symbol, "Series cannot be charted");
                        self.drag.reset();
                        self.phase = FetchPhase::Empty;
                    }
                }
            }
            Err(message) => {
                warn!(error = %message, "Chart fetch failed");
                self.drag.reset();
                self.phase = FetchPhase::Failure(message);
            }
        }

        true
    }

    /// Tick : émet un rafraîchissement si l'intervalle est écoulé
    ///
    /// Pas de nouvelle requête tant que la précédente n'a pas répondu,
    /// ni pendant un drag.
    pub fn tick(&mut self, now: Instant) -> Option<ChartRequest> {
        let interval = self.refresh_interval?;
        if self.pending_request_id.is_some() || self.drag.is_dragging() {
            return None;
        }
        let due = match self.last_request_at {
            Some(at) => now.saturating_duration_since(at) >= interval,
            None => true,
        };
        if due {
            Some(self.request_chart(now))
        } else {
            None
        }
    }

    // ========================================================================
    // Drag
    // ========================================================================

    /// Applique un geste de drag sur un plot de largeur `plot_width`
    ///
    /// Sans graphique, seul End a un effet (retour à Idle).
    pub fn handle_gesture(&mut self, gesture: Gesture, plot_width: f64) -> bool {
        let count = self.chart().map(ChartViewData::len).unwrap_or(0);
        let resolver = DragResolver::new(plot_width, count);
        let changed = self.drag.apply(gesture, &resolver);
        if changed {
            debug!(state = ?self.drag, "Drag state changed");
        }
        changed
    }

    /// Vérifie si un drag est en cours
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    // ========================================================================
    // Lecture
    // ========================================================================

    /// Graphique affiché, s'il existe
    pub fn chart(&self) -> Option<&ChartViewData> {
        match &self.phase {
            FetchPhase::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Point sélectionné par le drag
    pub fn selected_item(&self) -> Option<&ChartViewItem> {
        let index = self.drag.index()?;
        self.chart()?.item(index)
    }

    /// Dernier prix et variation par rapport à la référence
    ///
    /// Référence : clôture précédente en 1D, premier point sinon.
    pub fn price_change(&self) -> Option<(f64, f64, f64)> {
        let chart = self.chart()?;
        let last = chart.last_item()?.value;
        let reference = match (self.selected_range.shows_previous_close(), self.previous_close) {
            (true, Some(close)) => close,
            _ => chart.items.first()?.value,
        };
        if reference == 0.0 {
            return None;
        }
        let change = last - reference;
        Some((last, change, change / reference * 100.0))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSample;
    use chrono::{TimeZone, Utc};

    fn series(prices: &[f64], previous_close: Option<f64>) -> PriceSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        let mut series = PriceSeries::new("AAPL".to_string(), ChartRange::OneDay);
        series.previous_close = previous_close;
        for (i, &p) in prices.iter().enumerate() {
            series.add_sample(PriceSample::new(t0 + chrono::Duration::minutes(5 * i as i64), p));
        }
        series
    }

    #[test]
    fn test_app_creation() {
        let app = App::default();
        assert!(app.is_running());
        assert_eq!(app.symbol, "AAPL");
        assert_eq!(app.phase, FetchPhase::Initial);
        assert!(app.chart().is_none());
    }

    #[test]
    fn test_fetch_success() {
        let mut app = App::default();
        let now = Instant::now();
        let request = app.request_chart(now);
        assert_eq!(app.phase, FetchPhase::Fetching);

        assert!(app.apply_fetch_result(request.id, Ok(series(&[100.0, 105.0, 98.0], Some(102.0)))));
        let chart = app.chart().unwrap();
        assert_eq!(chart.len(), 3);
        assert_eq!(chart.previous_close_rule_mark_value, Some(102.0));
    }

    #[test]
    fn test_last_request_wins() {
        let mut app = App::default();
        let now = Instant::now();
        let first = app.request_chart(now);
        let second = app.next_range(now);
        assert!(second.id > first.id);
        assert_eq!(second.range, ChartRange::OneWeek);

        // Le résultat le plus récent arrive en premier
        assert!(app.apply_fetch_result(second.id, Ok(series(&[1.0, 2.0], None))));
        // L'ancien arrive ensuite : ignoré
        assert!(!app.apply_fetch_result(first.id, Ok(series(&[5.0, 6.0, 7.0], None))));

        assert_eq!(app.chart().unwrap().len(), 2);
    }

    #[test]
    fn test_stale_error_does_not_override_chart() {
        let mut app = App::default();
        let now = Instant::now();
        let first = app.request_chart(now);
        let second = app.request_chart(now);
        assert!(app.apply_fetch_result(second.id, Ok(series(&[1.0, 2.0], None))));
        assert!(!app.apply_fetch_result(first.id, Err("timeout".to_string())));
        assert!(app.chart().is_some());
    }

    #[test]
    fn test_empty_series_shows_placeholder() {
        let mut app = App::default();
        let request = app.request_chart(Instant::now());
        assert!(app.apply_fetch_result(request.id, Ok(series(&[], None))));
        assert_eq!(app.phase, FetchPhase::Empty);
    }

    #[test]
    fn test_fetch_failure() {
        let mut app = App::default();
        let request = app.request_chart(Instant::now());
        app.apply_fetch_result(request.id, Err("HTTP 404".to_string()));
        assert_eq!(app.phase, FetchPhase::Failure("HTTP 404".to_string()));
    }

    #[test]
    fn test_refresh_keeps_chart_visible() {
        let mut app = App::default();
        let now = Instant::now();
        let request = app.request_chart(now);
        app.apply_fetch_result(request.id, Ok(series(&[1.0, 2.0], None)));

        app.request_chart(now);
        assert!(app.is_refreshing);
        assert!(app.chart().is_some());
    }

    #[test]
    fn test_tick_refresh_schedule() {
        let mut app = App::default(); // 60s
        let start = Instant::now();

        // Premier tick : rien n'a été demandé → requête
        let request = app.tick(start).unwrap();
        // Requête en attente : pas de doublon
        assert!(app.tick(start + Duration::from_secs(120)).is_none());

        app.apply_fetch_result(request.id, Ok(series(&[1.0, 2.0], None)));
        assert!(app.tick(start + Duration::from_secs(30)).is_none());
        assert!(app.tick(start + Duration::from_secs(61)).is_some());
    }

    #[test]
    fn test_drag_over_chart() {
        let mut app = App::default();
        let request = app.request_chart(Instant::now());
        app.apply_fetch_result(request.id, Ok(series(&[10.0, 11.0, 12.0, 13.0, 14.0], None)));

        assert!(app.handle_gesture(Gesture::Start { x: 125.0 }, 250.0));
        assert!(app.is_dragging());
        assert_eq!(app.selected_item().unwrap().value, 12.0);

        app.handle_gesture(Gesture::End, 250.0);
        assert!(!app.is_dragging());
        assert!(app.selected_item().is_none());
    }

    #[test]
    fn test_drag_without_chart_is_ignored() {
        let mut app = App::default();
        assert!(!app.handle_gesture(Gesture::Start { x: 10.0 }, 250.0));
        assert!(!app.is_dragging());
    }

    #[test]
    fn test_manual_refresh_clamps_drag() {
        let mut app = App::default();
        let now = Instant::now();
        let request = app.request_chart(now);
        app.apply_fetch_result(request.id, Ok(series(&[10.0, 11.0, 12.0], None)));
        app.handle_gesture(Gesture::Start { x: 100.0 }, 100.0);
        assert_eq!(app.drag, DragState::Dragging(2));

        // Série plus courte : la sélection reste sur le dernier point
        let request = app.request_chart(now);
        app.apply_fetch_result(request.id, Ok(series(&[10.0, 11.0], None)));
        assert_eq!(app.drag, DragState::Dragging(1));

        // Échec : plus de graphique, plus de sélection
        let request = app.request_chart(now);
        app.apply_fetch_result(request.id, Err("timeout".to_string()));
        assert!(!app.is_dragging());
    }

    #[test]
    fn test_periodic_refresh_keeps_drag() {
        let mut app = App::default(); // 60s
        let start = Instant::now();
        let request = app.request_chart(start);
        app.apply_fetch_result(request.id, Ok(series(&[10.0, 11.0, 12.0, 13.0, 14.0], None)));
        app.handle_gesture(Gesture::Start { x: 125.0 }, 250.0);
        assert_eq!(app.drag, DragState::Dragging(2));

        // Pas de rafraîchissement tant que le bouton est enfoncé
        assert!(app.tick(start + Duration::from_secs(61)).is_none());
        assert_eq!(app.drag, DragState::Dragging(2));

        // Une réponse arrivée pendant le drag ne le termine pas
        let request = app.request_chart(start + Duration::from_secs(61));
        app.apply_fetch_result(
            request.id,
            Ok(series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0], None)),
        );
        assert_eq!(app.drag, DragState::Dragging(2));

        // Fin du geste : le polling reprend
        app.handle_gesture(Gesture::End, 250.0);
        assert!(app.tick(start + Duration::from_secs(130)).is_some());
    }

    #[test]
    fn test_price_change_against_previous_close() {
        let mut app = App::default();
        let request = app.request_chart(Instant::now());
        app.apply_fetch_result(request.id, Ok(series(&[100.0, 105.0], Some(104.0))));
        let (last, change, percent) = app.price_change().unwrap();
        assert_eq!(last, 105.0);
        assert!((change - 1.0).abs() < 1e-9);
        assert!((percent - 100.0 / 104.0).abs() < 1e-9);
    }
}
