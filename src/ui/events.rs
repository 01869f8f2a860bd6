// ============================================================================
// Gestion des événements
// ============================================================================
// Clavier, souris (drag sur le graphique), redimensionnement et ticks.
//
// CONCEPTS RUST :
// 1. Enums avec données : un variant par type d'événement
// 2. Non-blocking I/O : poll avec timeout, Tick si rien ne se passe
// 3. Conversion souris → Gesture : le coeur ne connaît pas crossterm
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::chart_data::Gesture;

/// Délai d'attente d'un événement avant de produire un Tick
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Événement souris (clic, drag, relâchement)
    Mouse(MouseEvent),

    /// Terminal redimensionné
    Resize(u16, u16),

    /// Tick régulier (rafraîchissement périodique)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    timeout: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            timeout: POLL_TIMEOUT,
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// Sans événement avant le timeout : Event::Tick
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.timeout)? {
            return Ok(Event::Tick);
        }

        let event = match event::read()? {
            // Sur certains OS, on reçoit Press ET Release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        };
        Ok(event)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers clavier
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        _ => None,
    }
}

/// 'q' (quitter, avec confirmation)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Ctrl+C (quitter immédiatement)
pub fn is_interrupt_event(event: &Event) -> bool {
    match event {
        Event::Key(key) => {
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
        }
        _ => false,
    }
}

/// Échap
pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

/// 'y' ou Entrée (confirmation)
pub fn is_confirm_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter)
    )
}

/// 'l', flèche droite ou Tab (période suivante)
pub fn is_next_range_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab)
    )
}

/// 'h', flèche gauche ou Shift+Tab (période précédente)
pub fn is_previous_range_event(event: &Event) -> bool {
    matches!(
        key_code(event),
        Some(KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab)
    )
}

/// 'r' (rafraîchir)
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

/// Chiffres '1' à '9' et '0' : accès direct à une période
///
/// '1' → première période, '0' → dixième.
pub fn range_shortcut(event: &Event) -> Option<usize> {
    match key_code(event)? {
        KeyCode::Char('0') => Some(9),
        KeyCode::Char(c @ '1'..='9') => Some(c as usize - '1' as usize),
        _ => None,
    }
}

// ============================================================================
// Souris → Gesture
// ============================================================================

/// Convertit un événement souris en geste de drag
///
/// - Clic gauche dans le plot : Start
/// - Drag gauche : Move (même hors du plot, le résolveur désélectionne)
/// - Relâchement gauche : End
///
/// x est exprimé en cellules, relatif au bord gauche du plot.
pub fn mouse_gesture(mouse: &MouseEvent, plot: Rect) -> Option<Gesture> {
    let x = mouse.column as f64 - plot.x as f64;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if contains(plot, mouse.column, mouse.row) {
                Some(Gesture::Start { x })
            } else {
                None
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => Some(Gesture::Move { x }),
        MouseEventKind::Up(MouseButton::Left) => Some(Gesture::End),
        _ => None,
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

// ============================================================================
// Tests
// ============================================================================
