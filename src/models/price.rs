// ============================================================================
// Structures : PriceSample / PriceSeries
// ============================================================================
// Série brute renvoyée par le fetch : une liste ordonnée de (timestamp, prix)
// plus la clôture précédente et le décalage horaire de la place de cotation.
// ============================================================================

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::models::ChartRange;

/// Un échantillon de prix (clôture de la bougie à `timestamp`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    /// Instant de l'échantillon
    pub timestamp: DateTime<Utc>,

    /// Prix (clôture)
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Série de prix pour un ticker et une période
///
/// CONCEPT RUST : Ownership
/// - PriceSeries possède le Vec d'échantillons
/// - Le transformer l'emprunte (&[PriceSample]) sans copie
#[derive(Debug, Clone)]
pub struct PriceSeries {
    /// Symbole du ticker (ex: "AAPL")
    pub symbol: String,

    /// Période demandée
    pub range: ChartRange,

    /// Décalage de la place de cotation par rapport à UTC, en secondes
    /// (ex: -14400 pour New York en heure d'été)
    pub gmt_offset_secs: i32,

    /// Clôture de la séance précédente, si connue
    pub previous_close: Option<f64>,

    /// Échantillons triés par timestamp croissant
    pub samples: Vec<PriceSample>,
}

impl PriceSeries {
    /// Crée une série vide
    pub fn new(symbol: String, range: ChartRange) -> Self {
        Self {
            symbol,
            range,
            gmt_offset_secs: 0,
            previous_close: None,
            samples: Vec::new(),
        }
    }

    /// Ajoute un échantillon
    pub fn add_sample(&mut self, sample: PriceSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Dernier prix connu
    pub fn last_price(&self) -> Option<f64> {
        self.samples.last().map(|s| s.price)
    }

    /// Fuseau de la place de cotation
    ///
    /// Un offset hors bornes (±24h) retombe sur UTC.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.gmt_offset_secs).unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_series_basics() {
        let mut series = PriceSeries::new("AAPL".to_string(), ChartRange::OneDay);
        assert!(series.is_empty());
        assert_eq!(series.last_price(), None);

        let t0 = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        series.add_sample(PriceSample::new(t0, 100.0));
        series.add_sample(PriceSample::new(t0 + chrono::Duration::minutes(5), 101.5));

        assert_eq!(series.len(), 2);
        assert_eq!(series.last_price(), Some(101.5));
    }

    #[test]
    fn test_timezone_fallback() {
        let mut series = PriceSeries::new("AAPL".to_string(), ChartRange::OneDay);
        series.gmt_offset_secs = -14400;
        assert_eq!(series.timezone().local_minus_utc(), -14400);

        series.gmt_offset_secs = 200_000; // hors bornes
        assert_eq!(series.timezone().local_minus_utc(), 0);
    }
}
