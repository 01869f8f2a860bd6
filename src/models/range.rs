// ============================================================================
// Enum : ChartRange
// ============================================================================
// Période affichée par le graphique (1D, 1W, 1M, ..., MAX)
//
// Chaque période détermine :
// 1. Les paramètres de la requête Yahoo (range + interval)
// 2. Le format des labels de l'axe X
// 3. Le format de la date affichée pendant le drag (tooltip)
// ============================================================================

use std::fmt;
use std::str::FromStr;

/// Période de temps affichée par le graphique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    /// Séance du jour (intraday)
    OneDay,
    /// 5 jours de bourse
    OneWeek,
    /// 1 mois
    OneMonth,
    /// 3 mois
    ThreeMonths,
    /// 6 mois
    SixMonths,
    /// Depuis le 1er janvier
    YearToDate,
    /// 1 an
    OneYear,
    /// 2 ans
    TwoYears,
    /// 5 ans
    FiveYears,
    /// Tout l'historique
    Max,
}

impl ChartRange {
    /// Retourne le label court pour les onglets
    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1D",
            ChartRange::OneWeek => "1W",
            ChartRange::OneMonth => "1M",
            ChartRange::ThreeMonths => "3M",
            ChartRange::SixMonths => "6M",
            ChartRange::YearToDate => "YTD",
            ChartRange::OneYear => "1Y",
            ChartRange::TwoYears => "2Y",
            ChartRange::FiveYears => "5Y",
            ChartRange::Max => "MAX",
        }
    }

    /// Paramètre `range` de l'API chart de Yahoo Finance
    pub fn to_yahoo_range(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1d",
            ChartRange::OneWeek => "5d",
            ChartRange::OneMonth => "1mo",
            ChartRange::ThreeMonths => "3mo",
            ChartRange::SixMonths => "6mo",
            ChartRange::YearToDate => "ytd",
            ChartRange::OneYear => "1y",
            ChartRange::TwoYears => "2y",
            ChartRange::FiveYears => "5y",
            ChartRange::Max => "max",
        }
    }

    /// Paramètre `interval` (granularité des échantillons)
    ///
    /// CONCEPT : quelques centaines de points par période au maximum
    /// - 1D : 5 minutes → ~78 points sur une séance US
    /// - 1W : 15 minutes → ~130 points
    /// - 1M : 1 heure
    /// - 3M..1Y : journalier
    /// - 2Y, 5Y : hebdomadaire
    /// - MAX : trimestriel
    pub fn to_yahoo_interval(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "5m",
            ChartRange::OneWeek => "15m",
            ChartRange::OneMonth => "1h",
            ChartRange::ThreeMonths
            | ChartRange::SixMonths
            | ChartRange::YearToDate
            | ChartRange::OneYear => "1d",
            ChartRange::TwoYears | ChartRange::FiveYears => "1wk",
            ChartRange::Max => "3mo",
        }
    }

    /// Format strftime des labels de l'axe X
    ///
    /// - Intraday : heure:minute
    /// - Quelques jours à quelques mois : mois + jour
    /// - Jusqu'à 2 ans : mois + année
    /// - Au-delà : année seule
    pub fn axis_date_format(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "%H:%M",
            ChartRange::OneWeek | ChartRange::OneMonth | ChartRange::ThreeMonths => "%b %-d",
            ChartRange::SixMonths
            | ChartRange::YearToDate
            | ChartRange::OneYear
            | ChartRange::TwoYears => "%b %Y",
            ChartRange::FiveYears | ChartRange::Max => "%Y",
        }
    }

    /// Format strftime de la date d'un point sélectionné (drag)
    ///
    /// Toujours au moins aussi précis que le label d'axe correspondant.
    pub fn tooltip_date_format(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "%H:%M",
            ChartRange::OneWeek => "%a %b %-d, %H:%M",
            _ => "%b %-d, %Y",
        }
    }

    /// Retourne true si la ligne "clôture précédente" a un sens pour cette période
    ///
    /// Seule la séance du jour se compare à la clôture de la veille.
    pub fn shows_previous_close(&self) -> bool {
        matches!(self, ChartRange::OneDay)
    }

    /// Retourne toutes les périodes, dans l'ordre des onglets
    pub fn all() -> Vec<ChartRange> {
        vec![
            ChartRange::OneDay,
            ChartRange::OneWeek,
            ChartRange::OneMonth,
            ChartRange::ThreeMonths,
            ChartRange::SixMonths,
            ChartRange::YearToDate,
            ChartRange::OneYear,
            ChartRange::TwoYears,
            ChartRange::FiveYears,
            ChartRange::Max,
        ]
    }

    /// Position dans la liste des onglets
    pub fn position(&self) -> usize {
        Self::all().iter().position(|r| r == self).unwrap_or(0)
    }

    /// Période suivante (cycle)
    pub fn next(&self) -> ChartRange {
        let all = Self::all();
        all[(self.position() + 1) % all.len()]
    }

    /// Période précédente (cycle)
    pub fn previous(&self) -> ChartRange {
        let all = Self::all();
        all[(self.position() + all.len() - 1) % all.len()]
    }
}

impl Default for ChartRange {
    /// Période par défaut : la séance du jour
    fn default() -> Self {
        ChartRange::OneDay
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse un label ("1d", "YTD", "max"...) sans tenir compte de la casse
///
/// Accepte aussi les codes Yahoo ("5d", "1mo", "3mo"...).
impl FromStr for ChartRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChartRange::all()
            .into_iter()
            .find(|r| {
                r.label().eq_ignore_ascii_case(wanted)
                    || r.to_yahoo_range().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| anyhow::anyhow!("Période inconnue : {:?}", s))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
