// ============================================================================
// Configuration
// ============================================================================
// Sources, de la plus faible à la plus forte :
// 1. Valeurs par défaut (AAPL, 1D, rafraîchissement 60s)
// 2. Fichier .env (chargé par dotenv dans main)
// 3. Variables d'environnement TICKERCHART_*
// 4. Premier argument de la ligne de commande : le symbole
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::ChartRange;

/// Variable d'environnement : symbole du ticker
pub const ENV_SYMBOL: &str = "TICKERCHART_SYMBOL";
/// Variable d'environnement : période initiale ("1d", "ytd", "5y"...)
pub const ENV_RANGE: &str = "TICKERCHART_RANGE";
/// Variable d'environnement : rafraîchissement en secondes (0 = désactivé)
pub const ENV_REFRESH_SECS: &str = "TICKERCHART_REFRESH_SECS";

const DEFAULT_SYMBOL: &str = "AAPL";
const DEFAULT_REFRESH_SECS: u64 = 60;

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Ticker affiché
    pub symbol: String,

    /// Période sélectionnée au démarrage
    pub range: ChartRange,

    /// Intervalle de rafraîchissement automatique (None = désactivé)
    pub refresh_interval: Option<Duration>,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            range: ChartRange::default(),
            refresh_interval: Some(Duration::from_secs(DEFAULT_REFRESH_SECS)),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Construit la configuration depuis l'environnement et les arguments
    pub fn load() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(|key| std::env::var(key).ok(), &args)
    }

    /// Construit la configuration depuis une source de variables et des arguments
    ///
    /// CONCEPT RUST : closure en paramètre
    /// - `lookup` abstrait std::env::var, ce qui rend la fonction testable
    pub fn from_sources<F>(lookup: F, args: &[String]) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(symbol) = lookup(ENV_SYMBOL) {
            config.symbol = normalize_symbol(&symbol)
                .with_context(|| format!("{} invalide : {:?}", ENV_SYMBOL, symbol))?;
        }

        if let Some(range) = lookup(ENV_RANGE) {
            config.range = range
                .parse()
                .with_context(|| format!("{} invalide", ENV_RANGE))?;
        }

        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{} doit être un entier : {:?}", ENV_REFRESH_SECS, secs))?;
            config.refresh_interval = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        if let Some(symbol) = args.first() {
            config.symbol = normalize_symbol(symbol)
                .with_context(|| format!("Symbole invalide : {:?}", symbol))?;
        }

        Ok(config)
    }
}

/// Met le symbole en majuscules et vérifie ses caractères
///
/// Autorisés : alphanumériques, '-', '.', '^', '=' (ex: BTC-USD, BRK.B, ^GSPC, EURUSD=X)
fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        anyhow::bail!("symbole vide");
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '^' | '='))
    {
        anyhow::bail!("caractère non autorisé dans {:?}", symbol);
    }
    Ok(symbol)
}

/// Répertoire de logs par défaut
///
/// - Linux : ~/.local/share/tickerchart/logs
/// - macOS : ~/Library/Application Support/tickerchart/logs
/// - Windows : %LOCALAPPDATA%\tickerchart\logs
/// - Sinon : ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("tickerchart").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], args: &[&str]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        Config::from_sources(|key| vars.get(key).cloned(), &args)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[], &[]).unwrap();
        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.range, ChartRange::OneDay);
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_env_overrides() {
        let config = load(
            &[(ENV_SYMBOL, "msft"), (ENV_RANGE, "ytd"), (ENV_REFRESH_SECS, "0")],
            &[],
        )
        .unwrap();
        assert_eq!(config.symbol, "MSFT");
        assert_eq!(config.range, ChartRange::YearToDate);
        assert_eq!(config.refresh_interval, None);
    }

    #[test]
    fn test_cli_argument_wins() {
        let config = load(&[(ENV_SYMBOL, "MSFT")], &["btc-usd"]).unwrap();
        assert_eq!(config.symbol, "BTC-USD");
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[(ENV_RANGE, "10y")], &[]).is_err());
        assert!(load(&[(ENV_REFRESH_SECS, "soon")], &[]).is_err());
        assert!(load(&[], &["AA PL"]).is_err());
        assert!(load(&[(ENV_SYMBOL, "  ")], &[]).is_err());
    }
}
