// ============================================================================
// Calcul des axes
// ============================================================================
// Bornes, pas "ronds" et labels des axes X et Y.
//
// Règles fixées (couvertes par les tests en bas de fichier) :
// - Axe Y : marge de 5% de chaque côté, 4 intervalles visés,
//   pas arrondi à 1, 2, 2.5 ou 5 × 10^k
// - Axe Y dégénéré (un seul prix) : largeur minimale de 1% du prix (>= 0.01)
// - Axe X : au plus 7 labels, sur les multiples du pas
// ============================================================================

use std::collections::BTreeMap;

use crate::models::{value_key, ChartAxisData};

/// Nombre d'intervalles visés entre les graduations de l'axe Y
pub const Y_TARGET_INTERVALS: f64 = 4.0;

/// Marge ajoutée au-dessus et en dessous des prix extrêmes (fraction de la largeur)
pub const Y_PADDING_RATIO: f64 = 0.05;

/// Largeur minimale de l'axe Y, relative au prix médian
pub const MIN_Y_SPAN_RATIO: f64 = 0.01;

/// Largeur minimale absolue de l'axe Y
pub const MIN_Y_SPAN: f64 = 0.01;

/// Nombre maximal de labels sur l'axe X
pub const MAX_X_LABELS: usize = 7;

/// Arrondit un pas brut au pas "lisible" supérieur le plus proche
///
/// CONCEPT : Nice numbers
/// - On décompose raw = f × 10^k avec 1 <= f < 10
/// - f est arrondi vers le haut à 1, 2, 2.5, 5 ou 10
/// - Ex: 1.925 → 2, 0.37 → 0.5, 130 → 200
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }

    let exponent = raw.log10().floor() as i32;
    let base = 10f64.powi(exponent);
    let fraction = raw / base;

    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * base
}

/// Nombre de décimales des labels de prix pour un pas donné
///
/// - Pas entier (1, 2, 5, 10...) → 0 décimale
/// - Pas >= 0.01 → 2 décimales
/// - En dessous (penny stocks, crypto) → 4 décimales
pub fn price_decimals(stride: f64) -> usize {
    if stride >= 1.0 && stride.fract() == 0.0 {
        0
    } else if stride >= 0.01 {
        2
    } else {
        4
    }
}

/// Formate un prix avec un nombre fixe de décimales
pub fn format_price(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    // Pas de "-0" ou "-0.00" dans les labels
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// Construit l'axe Y à partir du prix le plus bas et du plus haut
///
/// Les bornes renvoyées contiennent toujours [lowest, highest].
pub fn y_axis_data(lowest: f64, highest: f64) -> ChartAxisData {
    let (mut low, mut high) = if lowest <= highest {
        (lowest, highest)
    } else {
        (highest, lowest)
    };

    // Série plate ou à un seul point : on impose une largeur minimale
    let mid = (low + high) / 2.0;
    let min_span = (mid.abs() * MIN_Y_SPAN_RATIO).max(MIN_Y_SPAN);
    if high - low < min_span {
        low = mid - min_span / 2.0;
        high = mid + min_span / 2.0;
    }

    let padding = (high - low) * Y_PADDING_RATIO;
    let axis_start = low - padding;
    let axis_end = high + padding;
    let stride_by = nice_step((axis_end - axis_start) / Y_TARGET_INTERVALS);

    let decimals = price_decimals(stride_by);
    let mut map = BTreeMap::new();
    let first = (axis_start / stride_by).ceil() as i64;
    let last = (axis_end / stride_by).floor() as i64;
    for k in first..=last {
        let tick = k as f64 * stride_by;
        map.insert(value_key(tick), format_price(tick, decimals));
    }

    ChartAxisData {
        axis_start,
        axis_end,
        stride_by,
        map,
    }
}

/// Pas de l'axe X (en nombre de points) pour `count` points
///
/// ceil((count - 1) / (MAX_X_LABELS - 1)), au minimum 1
pub fn x_stride(count: usize) -> usize {
    let last = count.saturating_sub(1);
    let intervals = MAX_X_LABELS - 1;
    ((last + intervals - 1) / intervals).max(1)
}

/// Index des points qui reçoivent un label sur l'axe X
pub fn x_label_indices(count: usize) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    (0..count).step_by(x_stride(count)).collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_step_table() {
        // Table de référence : pas brut → pas retenu
        let table = [
            (1.925, 2.0),
            (0.37, 0.5),
            (130.0, 200.0),
            (1.0, 1.0),
            (2.2, 2.5),
            (3.1, 5.0),
            (7.5, 10.0),
            (0.012, 0.02),
            (24.0, 25.0),
        ];
        for (raw, expected) in table {
            let got = nice_step(raw);
            assert!((got - expected).abs() < 1e-9, "nice_step({}) = {}, attendu {}", raw, got, expected);
        }
    }

    #[test]
    fn test_nice_step_invalid_input() {
        assert_eq!(nice_step(0.0), 1.0);
        assert_eq!(nice_step(-3.0), 1.0);
        assert_eq!(nice_step(f64::NAN), 1.0);
    }

    #[test]
    fn test_price_decimals() {
        assert_eq!(price_decimals(2.0), 0);
        assert_eq!(price_decimals(2.5), 2);
        assert_eq!(price_decimals(0.05), 2);
        assert_eq!(price_decimals(0.002), 4);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(102.0, 0), "102");
        assert_eq!(format_price(97.5, 2), "97.50");
        assert_eq!(format_price(-0.0001, 2), "0.00");
        assert_eq!(format_price(-1.5, 1), "-1.5");
    }

    #[test]
    fn test_y_axis_snapshot() {
        // [98, 105] → marge 0.35 → [97.65, 105.35], pas 2
        let axis = y_axis_data(98.0, 105.0);
        assert!((axis.axis_start - 97.65).abs() < 1e-9);
        assert!((axis.axis_end - 105.35).abs() < 1e-9);
        assert_eq!(axis.stride_by, 2.0);

        let labels: Vec<&str> = axis.map.values().map(String::as_str).collect();
        assert_eq!(labels, vec!["100", "102", "104", "98"]); // ordre des clés texte
        assert_eq!(axis.label_for_value(98.0), Some("98"));
        assert_eq!(axis.label_for_value(104.0), Some("104"));
        assert_eq!(axis.label_for_value(106.0), None);
    }

    #[test]
    fn test_y_axis_flat_series_has_span() {
        let axis = y_axis_data(50.0, 50.0);
        assert!(axis.axis_end > axis.axis_start);
        assert!(axis.contains(50.0));
        // 1% de 50 = 0.5, plus la marge
        assert!(axis.span() >= 0.5);
    }

    #[test]
    fn test_y_axis_tiny_prices() {
        let axis = y_axis_data(0.0012, 0.0015);
        assert!(axis.contains(0.0012) && axis.contains(0.0015));
        assert!(axis.span() >= MIN_Y_SPAN);
        assert!(!axis.map.is_empty());
    }

    #[test]
    fn test_x_stride_label_count() {
        assert_eq!(x_stride(1), 1);
        assert_eq!(x_stride(7), 1);
        assert_eq!(x_stride(8), 2);
        assert_eq!(x_stride(100), 17);

        for count in 19..600 {
            let labels = x_label_indices(count).len();
            assert!(
                (5..=MAX_X_LABELS).contains(&labels),
                "{} points → {} labels",
                count,
                labels
            );
        }
        for count in 1..19 {
            assert!(x_label_indices(count).len() <= MAX_X_LABELS);
        }
    }
}
