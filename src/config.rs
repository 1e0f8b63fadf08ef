// ============================================================================
// Configuration
// ============================================================================
// Valeurs par défaut compilées + surcharge par variables d'environnement
//
// CONCEPTS RUST :
// 1. Constantes : `pub const` pour les limites de l'API
// 2. Builder léger : Config::from_env() lit l'environnement une seule fois
// 3. Option<String> : la clé API Gemini est facultative
// ============================================================================

use std::time::Duration;

use tracing::{debug, warn};

use crate::models::Currency;

/// Nombre maximal d'actifs par page (limite de l'API CoinGecko)
pub const MAX_COINS_PER_PAGE: u32 = 250;

/// Nombre d'identifiants gardés après une recherche libre
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Total d'actifs supposé avant la réponse de /global
pub const DEFAULT_TOTAL_ASSETS: u64 = 14_000;

/// Nombre de tentatives par requête
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Intervalle de rafraîchissement automatique de la liste
pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// Timeout d'une requête HTTP individuelle
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const USER_AGENT: &str = concat!("cryptopulse/", env!("CARGO_PKG_VERSION"));

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// URL de base de CoinGecko (sans slash final)
    pub coingecko_url: String,

    /// URL de base de l'API Gemini
    pub gemini_url: String,

    /// Clé API Gemini
    /// - None : les appels IA renvoient directement leur texte de repli
    pub gemini_api_key: Option<String>,

    /// Tentatives maximales par requête CoinGecko
    pub max_retries: u32,

    /// Période du rafraîchissement automatique
    pub refresh_interval: Duration,

    /// Devise affichée au démarrage
    pub default_currency: Currency,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coingecko_url: COINGECKO_API_URL.to_string(),
            gemini_url: GEMINI_API_URL.to_string(),
            gemini_api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            default_currency: Currency::default(),
        }
    }
}

impl Config {
    /// Construit la configuration depuis l'environnement
    ///
    /// Charge d'abord `.env` s'il existe, puis lit :
    /// - COINGECKO_API_URL, GEMINI_API_URL
    /// - GEMINI_API_KEY (ou API_KEY)
    /// - CRYPTOPULSE_MAX_RETRIES, CRYPTOPULSE_REFRESH_SECS
    /// - CRYPTOPULSE_CURRENCY (usd, eur, chf)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration depuis une fonction de lookup
    ///
    /// CONCEPT RUST : Closure générique
    /// - Permet de tester sans toucher aux vraies variables d'environnement
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("COINGECKO_API_URL") {
            config.coingecko_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("GEMINI_API_URL") {
            config.gemini_url = url.trim_end_matches('/').to_string();
        }

        config.gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(raw) = lookup("CRYPTOPULSE_MAX_RETRIES") {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => config.max_retries = n,
                _ => warn!(value = %raw, "Ignoring invalid CRYPTOPULSE_MAX_RETRIES"),
            }
        }
        if let Some(raw) = lookup("CRYPTOPULSE_REFRESH_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.refresh_interval = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid CRYPTOPULSE_REFRESH_SECS"),
            }
        }
        if let Some(raw) = lookup("CRYPTOPULSE_CURRENCY") {
            match Currency::from_code(raw.trim()) {
                Some(currency) => config.default_currency = currency,
                None => warn!(value = %raw, "Ignoring unknown CRYPTOPULSE_CURRENCY"),
            }
        }

        debug!(
            coingecko = %config.coingecko_url,
            gemini_key = config.gemini_api_key.is_some(),
            max_retries = config.max_retries,
            currency = config.default_currency.code(),
            "Configuration loaded"
        );
        config
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("COINGECKO_API_URL", "http://localhost:8080/"),
            ("API_KEY", "secret"),
            ("CRYPTOPULSE_MAX_RETRIES", "5"),
        ]));
        assert_eq!(config.coingecko_url, "http://localhost:8080");
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_gemini_key_takes_precedence_and_blank_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "primary"),
            ("API_KEY", "fallback"),
        ]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("primary"));

        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("CRYPTOPULSE_MAX_RETRIES", "0"),
            ("CRYPTOPULSE_REFRESH_SECS", "abc"),
        ]));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.refresh_interval, Duration::from_secs(DEFAULT_REFRESH_SECS));
    }

    #[test]
    fn test_default_currency_from_env() {
        let config = Config::from_lookup(lookup_from(&[("CRYPTOPULSE_CURRENCY", " CHF ")]));
        assert_eq!(config.default_currency, Currency::Chf);

        let config = Config::from_lookup(lookup_from(&[("CRYPTOPULSE_CURRENCY", "jpy")]));
        assert_eq!(config.default_currency, Currency::Usd);
    }
}
