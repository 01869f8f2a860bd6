// ============================================================================
// DragResolver et machine à états du drag
// ============================================================================
// Convertit la position x du pointeur (coordonnées locales au plot) en index
// de point, pour afficher la date et le prix du point survolé.
//
// Échelle : le domaine [0, n-1] est projeté sur [0, largeur du plot],
// exactement comme au rendu. La "colonne" du point i va de sa position
// jusqu'à celle du point i+1 ; le dernier point n'occupe que le bord droit.
//
// CONCEPTS RUST :
// 1. Option<usize> : "pas de sélection" n'est pas une erreur
// 2. Enum avec données : Dragging(index)
// ============================================================================

use tracing::trace;

/// Tolérance pour qu'un point pile sur la position d'un item ne retombe
/// pas sur l'item précédent à cause des arrondis flottants
const SNAP_EPSILON: f64 = 1e-9;

/// Résout une position x en index de point
///
/// Retourne None (pas de sélection) si :
/// - x est hors de [0, plot_width] ou non fini
/// - la largeur du plot est nulle, négative ou non finie
/// - il n'y a aucun point
pub fn resolve(x: f64, plot_width: f64, item_count: usize) -> Option<usize> {
    DragResolver::new(plot_width, item_count).resolve(x)
}

/// Résolveur pour une géométrie de plot donnée
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragResolver {
    /// Largeur du plot, dans l'unité des coordonnées reçues (pixels, cellules)
    pub plot_width: f64,

    /// Nombre de points du graphique
    pub item_count: usize,
}

impl DragResolver {
    pub fn new(plot_width: f64, item_count: usize) -> Self {
        Self {
            plot_width,
            item_count,
        }
    }

    fn is_valid(&self) -> bool {
        self.item_count > 0 && self.plot_width.is_finite() && self.plot_width > 0.0
    }

    /// Index du point sous la coordonnée x, ou None hors du plot
    ///
    /// Monotone et sans hystérésis : la même coordonnée donne toujours
    /// le même index, quelle que soit la position précédente.
    pub fn resolve(&self, x: f64) -> Option<usize> {
        if !self.is_valid() || !x.is_finite() || x < 0.0 || x > self.plot_width {
            return None;
        }

        if self.item_count == 1 {
            return Some(0);
        }

        let last = (self.item_count - 1) as f64;
        let value = x / self.plot_width * last;
        let index = ((value + SNAP_EPSILON).floor() as usize).min(self.item_count - 1);

        trace!(x, value, index, "Resolved drag position");
        Some(index)
    }

    /// Position x à laquelle le point `index` est dessiné
    pub fn item_x(&self, index: usize) -> Option<f64> {
        if !self.is_valid() || index >= self.item_count {
            return None;
        }
        if self.item_count == 1 {
            return Some(0.0);
        }
        let last = (self.item_count - 1) as f64;
        Some(index as f64 / last * self.plot_width)
    }

    /// Milieu de la colonne du point `index`
    pub fn column_center(&self, index: usize) -> Option<f64> {
        let start = self.item_x(index)?;
        match self.item_x(index + 1) {
            Some(end) => Some((start + end) / 2.0),
            // Dernier point : sa colonne se réduit au bord droit
            None => Some(start),
        }
    }
}

// ============================================================================
// Machine à états
// ============================================================================

/// Phase d'un geste de drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Début du geste (bouton enfoncé) à la position x
    Start { x: f64 },
    /// Déplacement pendant le geste
    Move { x: f64 },
    /// Fin du geste (bouton relâché)
    End,
}

/// État de l'interaction
///
/// - Idle : pas de drag
/// - Dragging(i) : le point i est sélectionné
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(usize),
}

impl DragState {
    /// Applique un geste ; retourne true si l'état a changé
    ///
    /// - Start/Move résolu → Dragging(index)
    /// - Start/Move hors du plot → état inchangé
    /// - End → Idle
    pub fn apply(&mut self, gesture: Gesture, resolver: &DragResolver) -> bool {
        let next = match gesture {
            Gesture::Start { x } | Gesture::Move { x } => match resolver.resolve(x) {
                Some(index) => DragState::Dragging(index),
                None => *self,
            },
            Gesture::End => DragState::Idle,
        };

        let changed = next != *self;
        *self = next;
        changed
    }

    /// Index sélectionné, si un drag est en cours
    pub fn index(&self) -> Option<usize> {
        match self {
            DragState::Dragging(index) => Some(*index),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    /// Garde la sélection dans une série de `item_count` points
    ///
    /// Le drag continue après un rafraîchissement ; seul End y met fin.
    pub fn clamp(&mut self, item_count: usize) {
        if let DragState::Dragging(index) = *self {
            *self = match item_count {
                0 => DragState::Idle,
                n => DragState::Dragging(index.min(n - 1)),
            };
        }
    }

    /// Remet l'état à Idle (changement de période)
    pub fn reset(&mut self) {
        *self = DragState::Idle;
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
