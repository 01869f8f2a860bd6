// ============================================================================
// ChartDataTransformer
// ============================================================================
// Transforme une série brute [(timestamp, prix)] en ChartViewData :
// 1. Validation (série non vide, prix finis, timestamps chronologiques)
// 2. Axe Y : bornes avec marge, pas arrondi, labels de prix
// 3. Axe X : bornes par index [0, n-1], labels de dates selon la période
// 4. Items : un par échantillon, index dense, date formatée
// 5. Ligne "clôture précédente" (séance du jour uniquement)
//
// CONCEPT : Fonction pure
// - Aucun état partagé, aucune I/O
// - Même entrée → même sortie, appelable depuis le thread UI
// ============================================================================

use std::collections::BTreeMap;

use chrono::{FixedOffset, Offset, Utc};
use tracing::{debug, warn};

use crate::chart_data::axis::{x_label_indices, x_stride, y_axis_data};
use crate::chart_data::error::DataError;
use crate::models::{
    index_key, ChartAxisData, ChartRange, ChartViewData, ChartViewItem, LineColor, PriceSample,
    PriceSeries,
};

/// Transformer configuré pour une période et un fuseau d'affichage
#[derive(Debug, Clone, Copy)]
pub struct ChartDataTransformer {
    /// Période sélectionnée (choisit les formats de dates)
    pub range: ChartRange,

    /// Fuseau de la place de cotation pour les labels
    pub timezone: FixedOffset,
}

impl ChartDataTransformer {
    /// Crée un transformer affichant les dates en UTC
    pub fn new(range: ChartRange) -> Self {
        Self {
            range,
            timezone: Utc.fix(),
        }
    }

    /// Transformer adapté à une série : sa période et le fuseau de sa place
    pub fn for_series(series: &PriceSeries) -> Self {
        Self::new(series.range).with_timezone(series.timezone())
    }

    /// Change le fuseau d'affichage des dates
    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    /// Transforme une série complète renvoyée par le fetch
    ///
    /// La couleur est déduite de la tendance de la série.
    pub fn transform_series(&self, series: &PriceSeries) -> Result<ChartViewData, DataError> {
        let first = series.samples.first().ok_or(DataError::EmptySeries)?.price;
        let last = series.last_price().ok_or(DataError::EmptySeries)?;

        let reference = if self.range.shows_previous_close() {
            series.previous_close
        } else {
            None
        };
        let line_color = LineColor::from_prices(first, last, reference);

        self.transform(&series.samples, series.previous_close, line_color)
    }

    /// Transforme des échantillons en données de présentation
    ///
    /// # Erreurs
    /// * `DataError::EmptySeries` - aucun échantillon
    /// * `DataError::NonFinitePrice` - prix NaN ou infini
    /// * `DataError::NonMonotonicTimestamps` - timestamp qui recule
    pub fn transform(
        &self,
        samples: &[PriceSample],
        previous_close: Option<f64>,
        line_color: LineColor,
    ) -> Result<ChartViewData, DataError> {
        validate(samples)?;

        // Clôture précédente : ignorée si non finie ou hors séance du jour
        let previous_close = match previous_close {
            Some(value) if !value.is_finite() => {
                warn!(value, "Ignoring non-finite previous close");
                None
            }
            Some(value) if self.range.shows_previous_close() => Some(value),
            _ => None,
        };

        // CONCEPT RUST : fold pour min/max en un seul passage
        let (mut lowest, mut highest) = samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), s| (min.min(s.price), max.max(s.price)),
        );

        // La ligne de référence doit toujours être visible
        if let Some(close) = previous_close {
            lowest = lowest.min(close);
            highest = highest.max(close);
        }

        let y_axis_data = y_axis_data(lowest, highest);
        let x_axis_data = self.x_axis_data(samples);
        let items = self.items(samples);

        debug!(
            range = %self.range,
            items = items.len(),
            y_start = y_axis_data.axis_start,
            y_end = y_axis_data.axis_end,
            y_stride = y_axis_data.stride_by,
            x_stride = x_axis_data.stride_by,
            "Built chart view data"
        );

        Ok(ChartViewData {
            x_axis_data,
            y_axis_data,
            items,
            line_color,
            previous_close_rule_mark_value: previous_close,
        })
    }

    /// Axe X indexé : [0, n-1], labels sur les multiples du pas
    ///
    /// Les échantillons irréguliers (nuits, week-ends) restent
    /// espacés régulièrement à l'écran.
    fn x_axis_data(&self, samples: &[PriceSample]) -> ChartAxisData {
        let count = samples.len();
        let format = self.range.axis_date_format();

        let map: BTreeMap<String, String> = x_label_indices(count)
            .into_iter()
            .map(|index| {
                let local = samples[index].timestamp.with_timezone(&self.timezone);
                (index_key(index), local.format(format).to_string())
            })
            .collect();

        // Un seul point : largeur minimale de 1 pour ne pas avoir d'échelle nulle
        let axis_end = count.saturating_sub(1).max(1) as f64;

        ChartAxisData {
            axis_start: 0.0,
            axis_end,
            stride_by: x_stride(count) as f64,
            map,
        }
    }

    /// Un ChartViewItem par échantillon, dans l'ordre
    fn items(&self, samples: &[PriceSample]) -> Vec<ChartViewItem> {
        let format = self.range.tooltip_date_format();

        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| ChartViewItem {
                timestamp: sample.timestamp,
                value: sample.price,
                index,
                formatted_date: sample
                    .timestamp
                    .with_timezone(&self.timezone)
                    .format(format)
                    .to_string(),
            })
            .collect()
    }
}

/// Vérifie qu'une série est dessinable
fn validate(samples: &[PriceSample]) -> Result<(), DataError> {
    if samples.is_empty() {
        return Err(DataError::EmptySeries);
    }

    for (index, sample) in samples.iter().enumerate() {
        if !sample.price.is_finite() {
            return Err(DataError::NonFinitePrice { index });
        }
        if index > 0 && sample.timestamp < samples[index - 1].timestamp {
            return Err(DataError::NonMonotonicTimestamps { index });
        }
    }

    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};

    /// 14:30 UTC = 09:30 à New York (heure d'hiver)
    fn market_open() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap()
    }

    fn samples(prices: &[f64], step: Duration) -> Vec<PriceSample> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceSample::new(market_open() + step * i as i32, p))
            .collect()
    }

    #[test]
    fn test_scenario_three_samples_with_previous_close() {
        let input = samples(&[100.0, 105.0, 98.0], Duration::minutes(5));
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform(&input, Some(102.0), LineColor::Down)
            .unwrap();

        // Bornes Y : au moins [98, 105], avec marge
        assert!(data.y_axis_data.axis_start < 98.0);
        assert!(data.y_axis_data.axis_end > 105.0);
        assert!(data.y_axis_data.contains(102.0));

        // Items : 3, index 0, 1, 2
        let indices: Vec<usize> = data.items.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(data.previous_close_rule_mark_value, Some(102.0));
        assert_eq!(data.line_color, LineColor::Down);
    }

    #[test]
    fn test_previous_close_outside_prices_extends_bounds() {
        let input = samples(&[100.0, 101.0, 100.5], Duration::minutes(5));
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform(&input, Some(110.0), LineColor::Down)
            .unwrap();
        assert!(data.y_axis_data.contains(110.0));
        assert!(data.y_axis_data.contains(100.0));
    }

    #[test]
    fn test_previous_close_omitted_outside_one_day() {
        let input = samples(&[100.0, 101.0], Duration::days(1));
        let data = ChartDataTransformer::new(ChartRange::OneMonth)
            .transform(&input, Some(150.0), LineColor::Up)
            .unwrap();
        assert_eq!(data.previous_close_rule_mark_value, None);
        // Pas d'extension des bornes jusqu'à 150
        assert!(data.y_axis_data.axis_end < 150.0);
    }

    #[test]
    fn test_non_finite_previous_close_is_ignored() {
        let input = samples(&[100.0, 101.0], Duration::minutes(5));
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform(&input, Some(f64::NAN), LineColor::Up)
            .unwrap();
        assert_eq!(data.previous_close_rule_mark_value, None);
    }

    #[test]
    fn test_single_sample_is_not_degenerate() {
        let input = samples(&[50.0], Duration::minutes(5));
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform(&input, None, LineColor::Neutral)
            .unwrap();

        assert_eq!(data.items.len(), 1);
        assert_eq!(data.items[0].index, 0);
        assert!(data.y_axis_data.span() > 0.0);
        assert!(data.y_axis_data.contains(50.0));
        assert!(data.x_axis_data.span() > 0.0);
    }

    #[test]
    fn test_empty_series_fails() {
        let result = ChartDataTransformer::new(ChartRange::OneDay).transform(&[], None, LineColor::Up);
        assert_eq!(result.unwrap_err(), DataError::EmptySeries);

        let series = PriceSeries::new("AAPL".to_string(), ChartRange::OneDay);
        let result = ChartDataTransformer::new(ChartRange::OneDay).transform_series(&series);
        assert_eq!(result.unwrap_err(), DataError::EmptySeries);
    }

    #[test]
    fn test_malformed_series_fails() {
        let mut input = samples(&[100.0, 101.0, 102.0], Duration::minutes(5));
        input.swap(1, 2);
        let result = ChartDataTransformer::new(ChartRange::OneDay).transform(&input, None, LineColor::Up);
        assert_eq!(result.unwrap_err(), DataError::NonMonotonicTimestamps { index: 2 });

        let input = samples(&[100.0, f64::INFINITY], Duration::minutes(5));
        let result = ChartDataTransformer::new(ChartRange::OneDay).transform(&input, None, LineColor::Up);
        assert_eq!(result.unwrap_err(), DataError::NonFinitePrice { index: 1 });
    }

    #[test]
    fn test_items_and_axes_properties() {
        // Propriétés sur plusieurs tailles de séries
        for count in 2..200 {
            let prices: Vec<f64> = (0..count)
                .map(|i| 100.0 + ((i * 7919) % 23) as f64 - 11.0)
                .collect();
            let input = samples(&prices, Duration::minutes(5));
            let data = ChartDataTransformer::new(ChartRange::OneDay)
                .transform(&input, Some(95.0), LineColor::Up)
                .unwrap();

            assert_eq!(data.items.len(), count);
            for (position, item) in data.items.iter().enumerate() {
                assert_eq!(item.index, position);
            }

            assert_eq!(data.x_axis_data.axis_start, 0.0);
            assert_eq!(data.x_axis_data.axis_end, (count - 1) as f64);

            for price in &prices {
                assert!(data.y_axis_data.contains(*price));
            }
            assert!(data.y_axis_data.contains(95.0));
            assert!(data.y_axis_data.axis_start <= data.y_axis_data.axis_end);
        }
    }

    #[test]
    fn test_x_labels_on_stride_multiples() {
        let prices: Vec<f64> = (0..78).map(|i| 100.0 + i as f64 * 0.1).collect();
        let input = samples(&prices, Duration::minutes(5));
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform(&input, None, LineColor::Up)
            .unwrap();

        let stride = data.x_axis_data.stride_by as usize;
        assert_eq!(stride, 13); // ceil(77 / 6)
        for key in data.x_axis_data.map.keys() {
            let index: usize = key.parse().unwrap();
            assert_eq!(index % stride, 0);
        }
        // 5 minutes × 13 = 65 minutes entre deux labels, en UTC
        assert_eq!(data.x_axis_data.label_for_index(0), Some("14:30"));
        assert_eq!(data.x_axis_data.label_for_index(13), Some("15:35"));
    }

    #[test]
    fn test_labels_use_exchange_timezone() {
        let input = samples(&[100.0, 101.0], Duration::minutes(5));
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .with_timezone(new_york)
            .transform(&input, None, LineColor::Up)
            .unwrap();

        assert_eq!(data.x_axis_data.label_for_index(0), Some("09:30"));
        assert_eq!(data.items[1].formatted_date, "09:35");
    }

    #[test]
    fn test_label_granularity_per_range() {
        let input = samples(&[100.0, 101.0], Duration::days(1));
        let table = [
            (ChartRange::OneDay, "14:30", "14:30"),
            (ChartRange::OneWeek, "Mar 4", "Mon Mar 4, 14:30"),
            (ChartRange::ThreeMonths, "Mar 4", "Mar 4, 2024"),
            (ChartRange::OneYear, "Mar 2024", "Mar 4, 2024"),
            (ChartRange::Max, "2024", "Mar 4, 2024"),
        ];
        for (range, axis_label, tooltip) in table {
            let data = ChartDataTransformer::new(range)
                .transform(&input, None, LineColor::Up)
                .unwrap();
            assert_eq!(data.x_axis_data.label_for_index(0), Some(axis_label), "range {}", range);
            assert_eq!(data.items[0].formatted_date, tooltip, "range {}", range);
        }
    }

    #[test]
    fn test_transform_series_line_color() {
        let mut series = PriceSeries::new("AAPL".to_string(), ChartRange::OneDay);
        series.previous_close = Some(104.0);
        series.samples = samples(&[100.0, 103.0], Duration::minutes(5));

        let data = ChartDataTransformer::new(ChartRange::OneDay)
            .transform_series(&series)
            .unwrap();
        // 103 < 104 (clôture précédente) même si la séance monte
        assert_eq!(data.line_color, LineColor::Down);

        let data = ChartDataTransformer::new(ChartRange::OneMonth)
            .transform_series(&series)
            .unwrap();
        // Hors 1D : comparaison au premier prix
        assert_eq!(data.line_color, LineColor::Up);
    }

    #[test]
    fn test_for_series_uses_series_range_and_timezone() {
        let mut series = PriceSeries::new("AAPL".to_string(), ChartRange::OneMonth);
        series.gmt_offset_secs = -5 * 3600;
        series.previous_close = Some(104.0);
        series.samples = samples(&[100.0, 103.0], Duration::days(1));

        let transformer = ChartDataTransformer::for_series(&series);
        assert_eq!(transformer.range, ChartRange::OneMonth);

        let data = transformer.transform_series(&series).unwrap();
        // Hors 1D : pas de ligne de clôture précédente
        assert_eq!(data.previous_close_rule_mark_value, None);
        assert_eq!(data.x_axis_data.label_for_index(0), Some("Mar 4"));
        assert_eq!(data.items[0].formatted_date, "Mar 4, 2024");

        // 1D : heure de New York
        series.range = ChartRange::OneDay;
        series.samples = samples(&[100.0, 103.0], Duration::minutes(5));
        let data = ChartDataTransformer::for_series(&series)
            .transform_series(&series)
            .unwrap();
        assert_eq!(data.items[0].formatted_date, "09:30");
        assert_eq!(data.previous_close_rule_mark_value, Some(104.0));
    }

    #[test]
    fn test_transform_is_pure() {
        let input = samples(&[100.0, 105.0, 98.0], Duration::minutes(5));
        let transformer = ChartDataTransformer::new(ChartRange::OneDay);
        let a = transformer.transform(&input, Some(102.0), LineColor::Down).unwrap();
        let b = transformer.transform(&input, Some(102.0), LineColor::Down).unwrap();
        assert_eq!(a, b);
    }
}
