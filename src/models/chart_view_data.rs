// ============================================================================
// Structures : ChartViewData / ChartViewItem / ChartAxisData
// ============================================================================
// Données de présentation du graphique, prêtes à être dessinées.
//
// CONCEPTS :
// 1. Immutabilité : une nouvelle ChartViewData à chaque rafraîchissement,
//    jamais modifiée ensuite (pas de &mut exposé)
// 2. Labels par clé texte : BTreeMap<String, String> avec un encodage
//    canonique des positions (voir `index_key` / `value_key`)
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

// ============================================================================
// Clés canoniques des labels
// ============================================================================

/// Clé d'un label de l'axe X : l'index en décimal ("0", "12", ...)
pub fn index_key(index: usize) -> String {
    index.to_string()
}

/// Clé d'un label de l'axe Y : la valeur avec exactement 4 décimales
///
/// CONCEPT : Encodage canonique
/// - 102.5 → "102.5000"
/// - -0.0 et les très petites valeurs négatives → "0.0000" (jamais "-0.0000")
pub fn value_key(value: f64) -> String {
    let key = format!("{:.4}", value);
    if key.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        "0.0000".to_string()
    } else {
        key
    }
}

// ============================================================================
// Couleur de la ligne
// ============================================================================

/// Tendance de la série, qui choisit la couleur de la ligne et de l'aire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineColor {
    /// Dernier prix >= référence
    Up,
    /// Dernier prix < référence
    Down,
    /// Pas de référence exploitable
    Neutral,
}

impl LineColor {
    /// Déduit la couleur d'une série
    ///
    /// La référence est la clôture précédente si elle est fournie,
    /// sinon le premier prix de la série.
    pub fn from_prices(first: f64, last: f64, previous_close: Option<f64>) -> Self {
        let reference = previous_close.unwrap_or(first);
        if !reference.is_finite() || !last.is_finite() {
            LineColor::Neutral
        } else if last >= reference {
            LineColor::Up
        } else {
            LineColor::Down
        }
    }

    /// Triplet RGB utilisé par le rendu
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            LineColor::Up => (52, 199, 89),
            LineColor::Down => (255, 59, 48),
            LineColor::Neutral => (10, 132, 255),
        }
    }
}

// ============================================================================
// Axes
// ============================================================================

/// Configuration d'un axe : bornes, pas des graduations et labels
#[derive(Debug, Clone, PartialEq)]
pub struct ChartAxisData {
    /// Borne basse de l'échelle
    pub axis_start: f64,

    /// Borne haute de l'échelle (>= axis_start)
    pub axis_end: f64,

    /// Espacement entre deux graduations
    pub stride_by: f64,

    /// Position de graduation (clé canonique) → label affiché
    /// Une graduation sans label n'est pas dessinée.
    pub map: BTreeMap<String, String>,
}

impl ChartAxisData {
    /// Largeur de l'échelle
    pub fn span(&self) -> f64 {
        self.axis_end - self.axis_start
    }

    /// Vérifie qu'une valeur est dans les bornes (incluses)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.axis_start && value <= self.axis_end
    }

    /// Label d'une graduation de l'axe X
    pub fn label_for_index(&self, index: usize) -> Option<&str> {
        self.map.get(&index_key(index)).map(String::as_str)
    }

    /// Label d'une graduation de l'axe Y
    pub fn label_for_value(&self, value: f64) -> Option<&str> {
        self.map.get(&value_key(value)).map(String::as_str)
    }

    /// Graduations obtenues en avançant de `stride_by` depuis 0, dans les bornes
    ///
    /// C'est ainsi que le rendu énumère les graduations ; seules celles
    /// présentes dans `map` reçoivent un label.
    pub fn tick_positions(&self) -> Vec<f64> {
        if !(self.stride_by > 0.0) || !self.stride_by.is_finite() {
            return Vec::new();
        }
        let first = (self.axis_start / self.stride_by).ceil() as i64;
        let last = (self.axis_end / self.stride_by).floor() as i64;
        (first..=last).map(|k| k as f64 * self.stride_by).collect()
    }

    /// Labels dans l'ordre des graduations
    pub fn ordered_labels(&self) -> Vec<(f64, &str)> {
        self.tick_positions()
            .into_iter()
            .filter_map(|tick| {
                self.map
                    .get(&value_key(tick))
                    .or_else(|| {
                        // Axe X : les clés sont des index entiers
                        if tick >= 0.0 && tick.fract() == 0.0 {
                            self.map.get(&index_key(tick as usize))
                        } else {
                            None
                        }
                    })
                    .map(|label| (tick, label.as_str()))
            })
            .collect()
    }
}

// ============================================================================
// Points et données complètes
// ============================================================================

/// Un point du graphique
#[derive(Debug, Clone, PartialEq)]
pub struct ChartViewItem {
    /// Instant de l'échantillon
    pub timestamp: DateTime<Utc>,

    /// Prix
    pub value: f64,

    /// Position dans la série (0, 1, 2, ...)
    pub index: usize,

    /// Date formatée pour l'affichage pendant le drag
    pub formatted_date: String,
}

/// Données de présentation complètes d'un graphique
///
/// Invariants garantis par le transformer :
/// - `items` non vide, ordre chronologique
/// - `items[i].index == i`
#[derive(Debug, Clone, PartialEq)]
pub struct ChartViewData {
    pub x_axis_data: ChartAxisData,
    pub y_axis_data: ChartAxisData,
    pub items: Vec<ChartViewItem>,
    pub line_color: LineColor,

    /// Valeur de la ligne de référence "clôture précédente"
    pub previous_close_rule_mark_value: Option<f64>,
}

impl ChartViewData {
    /// Nombre de points
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Point à l'index donné
    pub fn item(&self, index: usize) -> Option<&ChartViewItem> {
        self.items.get(index)
    }

    /// Dernier point (prix le plus récent)
    pub fn last_item(&self) -> Option<&ChartViewItem> {
        self.items.last()
    }

    /// Points (index, valeur) pour le widget Chart
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.items
            .iter()
            .map(|item| (item.index as f64, item.value))
            .collect()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(start: f64, end: f64, stride: f64, labels: &[(f64, &str)]) -> ChartAxisData {
        ChartAxisData {
            axis_start: start,
            axis_end: end,
            stride_by: stride,
            map: labels
                .iter()
                .map(|&(v, l)| (value_key(v), l.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_value_key_is_canonical() {
        assert_eq!(value_key(102.5), "102.5000");
        assert_eq!(value_key(98.0), "98.0000");
        assert_eq!(value_key(-0.0), "0.0000");
        assert_eq!(value_key(-0.00001), "0.0000");
        assert_eq!(value_key(-1.25), "-1.2500");
        // Erreur d'arrondi flottant : même clé
        assert_eq!(value_key(0.1 + 0.2), value_key(0.3));
    }

    #[test]
    fn test_tick_positions_step_from_zero() {
        let a = axis(97.3, 106.1, 2.0, &[]);
        assert_eq!(a.tick_positions(), vec![98.0, 100.0, 102.0, 104.0, 106.0]);

        let degenerate = axis(1.0, 2.0, 0.0, &[]);
        assert!(degenerate.tick_positions().is_empty());
    }

    #[test]
    fn test_labels_lookup() {
        let a = axis(97.3, 106.1, 2.0, &[(98.0, "98"), (102.0, "102")]);
        assert_eq!(a.label_for_value(98.0), Some("98"));
        assert_eq!(a.label_for_value(100.0), None); // pas de label = pas de graduation
        assert_eq!(a.ordered_labels(), vec![(98.0, "98"), (102.0, "102")]);
    }

    #[test]
    fn test_line_color() {
        assert_eq!(LineColor::from_prices(100.0, 105.0, None), LineColor::Up);
        assert_eq!(LineColor::from_prices(100.0, 98.0, None), LineColor::Down);
        // La clôture précédente prime sur le premier prix
        assert_eq!(LineColor::from_prices(100.0, 101.0, Some(102.0)), LineColor::Down);
        assert_eq!(LineColor::from_prices(100.0, f64::NAN, None), LineColor::Neutral);
    }
}
