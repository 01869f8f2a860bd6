// ============================================================================
// API Client : Yahoo Finance (chart v8)
// ============================================================================
// Récupère la série de prix d'un ticker pour une période donnée.
//
// CONCEPTS RUST :
// 1. async/await : la requête ne bloque que le worker thread
// 2. Serde : désérialisation JSON vers des structures privées
// 3. anyhow::Context : messages d'erreur lisibles
//
// Pas de retry ici : une erreur remonte telle quelle à l'application.
// ============================================================================

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{ChartRange, PriceSample, PriceSeries};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// ============================================================================
// Structures pour parser la réponse JSON de Yahoo Finance
// ============================================================================

/// Réponse complète de l'API chart
#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

/// Métadonnées du ticker
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    symbol: String,
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i32>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

// ============================================================================
// Fonctions publiques de l'API
// ============================================================================

/// Récupère la série de prix d'un ticker
///
/// # Arguments
/// * `symbol` - Symbole du ticker (ex: "AAPL", "BTC-USD")
/// * `range` - Période souhaitée
///
/// # Retourne
/// * `Result<PriceSeries>` - Série triée par timestamp, ou erreur
#[instrument(skip(range), fields(range = %range))]
pub async fn fetch_chart_series(symbol: &str, range: ChartRange) -> Result<PriceSeries> {
    let url = build_yahoo_url(symbol, range);
    debug!(url = %url, "Built Yahoo Finance API URL");

    // User-Agent obligatoire, sinon Yahoo répond 429
    let client = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .context("Échec de la création du client HTTP")?;

    let response = client
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers Yahoo Finance")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(status = %status, "Yahoo Finance returned error status");
        anyhow::bail!("Yahoo Finance a retourné une erreur : HTTP {}", status);
    }

    let yahoo_response: YahooResponse = response
        .json()
        .await
        .context("Échec du parsing JSON de la réponse Yahoo")?;

    let series = parse_yahoo_response(yahoo_response, symbol, range)?;

    info!(samples = series.len(), previous_close = ?series.previous_close, "Successfully fetched chart series");
    Ok(series)
}

/// Construit l'URL de l'API chart
///
/// `includePrePost=false` : uniquement la séance régulière
fn build_yahoo_url(symbol: &str, range: ChartRange) -> String {
    format!(
        "{}/{}?range={}&interval={}&includePrePost=false",
        YAHOO_CHART_URL,
        symbol,
        range.to_yahoo_range(),
        range.to_yahoo_interval()
    )
}

/// Convertit la réponse Yahoo en PriceSeries
///
/// - Les bougies sans clôture sont ignorées (comptées dans un warn!)
/// - Une série vide est renvoyée telle quelle : c'est au transformer
///   de la refuser, l'application affichera alors un état vide
fn parse_yahoo_response(
    yahoo_response: YahooResponse,
    symbol: &str,
    range: ChartRange,
) -> Result<PriceSeries> {
    if let Some(err) = yahoo_response.chart.error {
        error!(code = ?err.code, description = ?err.description, "Yahoo Finance returned an error payload");
        anyhow::bail!(
            "Yahoo Finance : {}",
            err.description.unwrap_or_else(|| "erreur inconnue".to_string())
        );
    }

    let result = yahoo_response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .context("Aucune donnée retournée par Yahoo Finance")?;

    if !result.meta.symbol.eq_ignore_ascii_case(symbol) {
        warn!(requested = %symbol, received = %result.meta.symbol, "Yahoo returned a different symbol");
    }

    let mut series = PriceSeries::new(symbol.to_string(), range);
    series.gmt_offset_secs = result.meta.gmt_offset.unwrap_or(0);
    // chartPreviousClose : clôture avant le début de la période ;
    // previousClose n'est présent que pour 1D
    series.previous_close = result.meta.previous_close.or(result.meta.chart_previous_close);

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();

    let mut skipped_count = 0;
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let close = match closes.get(i).and_then(|&v| v) {
            Some(v) => v,
            None => {
                skipped_count += 1;
                continue;
            }
        };

        let datetime = DateTime::from_timestamp(timestamp, 0).context("Timestamp invalide")?;
        series.add_sample(PriceSample::new(datetime, close));
    }

    if skipped_count > 0 {
        warn!(
            skipped = skipped_count,
            total = timestamps.len(),
            "Skipped samples with missing close"
        );
    }

    debug!(
        parsed = series.len(),
        total = timestamps.len(),
        gmt_offset = series.gmt_offset_secs,
        "Finished parsing chart series"
    );

    Ok(series)
}

// ============================================================================
// Tests unitaires
// ============================================================================
