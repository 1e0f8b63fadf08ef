// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Liste de marché, statistiques globales, recherche et séries de prix
//
// CONCEPTS RUST :
// 1. async/await : chaque méthode suspend à chaque appel réseau
// 2. Arc<dyn Trait> : transport et horloge partagés entre les tâches
// 3. serde_json::Value puis from_value : on vérifie la forme avant de typer,
//    une réponse "pas un tableau" n'est pas une erreur mais "pas de données"
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::retry::{fetch_json, RetryPolicy, Sleeper};
use crate::api::transport::HttpTransport;
use crate::config::{MAX_COINS_PER_PAGE, SEARCH_RESULT_LIMIT};
use crate::error::FetchError;
use crate::models::{Category, ChartSeries, Coin, Currency, LookbackWindow, SortOrder};

// ============================================================================
// Paramètres de la liste
// ============================================================================

/// Paramètres d'une requête /coins/markets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub currency: Currency,
    pub order: SortOrder,
    /// Plafonné à 250 à la construction de l'URL
    pub per_page: u32,
    /// Page, base 1
    pub page: u32,
    pub category: Category,
}

impl MarketQuery {
    pub fn new(currency: Currency, order: SortOrder, category: Category, page: u32) -> Self {
        Self {
            currency,
            order,
            per_page: MAX_COINS_PER_PAGE,
            page,
            category,
        }
    }
}

impl Default for MarketQuery {
    fn default() -> Self {
        Self::new(Currency::default(), SortOrder::default(), Category::default(), 1)
    }
}

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: Option<GlobalData>,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    active_cryptocurrencies: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Option<Vec<Vec<f64>>>,
}

// ============================================================================
// Client
// ============================================================================

/// Client CoinGecko
#[derive(Clone)]
pub struct MarketClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl MarketClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            sleeper,
            policy,
        }
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        fetch_json(self.transport.as_ref(), self.sleeper.as_ref(), &self.policy, url).await
    }

    /// Construit l'URL /coins/markets pour une page de la liste
    pub fn markets_url(&self, query: &MarketQuery) -> String {
        let mut url = format!(
            "{}/coins/markets?vs_currency={}&order={}&per_page={}&page={}&sparkline=true&price_change_percentage=24h",
            self.base_url,
            query.currency.code(),
            query.order.api_id(),
            query.per_page.min(MAX_COINS_PER_PAGE),
            query.page,
        );
        let category = query.category.api_id();
        if !category.is_empty() {
            url.push_str("&category=");
            url.push_str(category);
        }
        url
    }

    /// URL /coins/markets restreinte à une liste d'identifiants
    pub fn markets_by_ids_url(&self, currency: Currency, ids: &[String]) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&ids={}&sparkline=true&price_change_percentage=24h",
            self.base_url,
            currency.code(),
            ids.join(","),
        )
    }

    pub fn search_url(&self, query: &str) -> String {
        format!("{}/search?query={}", self.base_url, urlencoding::encode(query))
    }

    pub fn chart_url(&self, coin_id: &str, currency: Currency, window: LookbackWindow) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            coin_id,
            currency.code(),
            window.days()
        )
    }

    pub fn global_url(&self) -> String {
        format!("{}/global", self.base_url)
    }

    /// Récupère une page de la liste de marché
    ///
    /// # Retourne
    /// * `Ok(Some(coins))` - la page (éventuellement vide)
    /// * `Ok(None)` - réponse qui n'est pas un tableau d'actifs (pas de données)
    /// * `Err(_)` - échec après épuisement des tentatives
    #[instrument(skip(self), fields(page = query.page, currency = query.currency.code()))]
    pub async fn fetch_markets(&self, query: &MarketQuery) -> Result<Option<Vec<Coin>>, FetchError> {
        let url = self.markets_url(query);
        let value = self.get_json(&url).await?;
        let coins = parse_coin_array(value);
        if let Some(coins) = &coins {
            info!(count = coins.len(), "Market page fetched");
        }
        Ok(coins)
    }

    /// Nombre total d'actifs actifs (/global)
    ///
    /// `Ok(None)` si le champ est absent de la réponse.
    #[instrument(skip(self))]
    pub async fn fetch_total_assets(&self) -> Result<Option<u64>, FetchError> {
        let value = self.get_json(&self.global_url()).await?;
        let total = serde_json::from_value::<GlobalResponse>(value)
            .ok()
            .and_then(|r| r.data)
            .and_then(|d| d.active_cryptocurrencies)
            .filter(|&n| n > 0);
        debug!(?total, "Global stats fetched");
        Ok(total)
    }

    /// Recherche libre en deux étapes
    ///
    /// 1. /search → les 10 premiers identifiants
    /// 2. /coins/markets?ids=... → les fiches complètes
    ///
    /// Une requête vide ne déclenche aucun appel réseau.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, currency: Currency) -> Result<Vec<Coin>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let value = self.get_json(&self.search_url(query)).await?;
        let ids: Vec<String> = serde_json::from_value::<SearchResponse>(value)
            .map(|r| r.coins)
            .unwrap_or_default()
            .into_iter()
            .take(SEARCH_RESULT_LIMIT)
            .map(|hit| hit.id)
            .collect();

        if ids.is_empty() {
            info!("Search returned no match");
            return Ok(Vec::new());
        }

        debug!(ids = ?ids, "Search resolved identifiers");
        let value = self.get_json(&self.markets_by_ids_url(currency, &ids)).await?;
        Ok(parse_coin_array(value).unwrap_or_default())
    }

    /// Série de prix d'un actif sur une fenêtre
    ///
    /// Réponse sans champ `prices` : série vide.
    #[instrument(skip(self))]
    pub async fn fetch_chart(
        &self,
        coin_id: &str,
        currency: Currency,
        window: LookbackWindow,
    ) -> Result<ChartSeries, FetchError> {
        let value = self.get_json(&self.chart_url(coin_id, currency, window)).await?;
        let pairs = serde_json::from_value::<MarketChartResponse>(value)
            .ok()
            .and_then(|r| r.prices)
            .unwrap_or_default();

        let series = ChartSeries::from_raw_pairs(coin_id.to_string(), window, &pairs);
        info!(points = series.len(), "Chart fetched");
        Ok(series)
    }
}

/// Interprète une réponse comme un tableau d'actifs
///
/// Tout ce qui n'est pas un tableau d'actifs valides est traité comme
/// "pas de données" plutôt que comme une erreur.
fn parse_coin_array(value: serde_json::Value) -> Option<Vec<Coin>> {
    if !value.is_array() {
        warn!("Expected an array of coins, treating response as no data");
        return None;
    }
    match serde_json::from_value::<Vec<Coin>>(value) {
        Ok(coins) => Some(coins),
        Err(e) => {
            warn!(error = %e, "Malformed coin records, treating response as no data");
            None
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::retry::mock::MockSleeper;
    use crate::api::transport::mock::MockTransport;
    use serde_json::json;

    const BASE: &str = "https://api.coingecko.com/api/v3";

    fn client(transport: Arc<MockTransport>) -> MarketClient {
        MarketClient::new(BASE, transport, Arc::new(MockSleeper::new()), RetryPolicy::default())
    }

    fn coin_json(id: &str) -> serde_json::Value {
        json!({ "id": id, "name": id.to_uppercase(), "symbol": id, "current_price": 1.0 })
    }

    #[test]
    fn test_markets_url_default_query() {
        let c = client(Arc::new(MockTransport::new()));
        let url = c.markets_url(&MarketQuery::default());
        assert_eq!(
            url,
            "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&page=1&sparkline=true&price_change_percentage=24h"
        );
        assert!(url.contains("vs_currency=usd&order=market_cap_desc&per_page=250&page=1"));
        assert!(!url.contains("category"));
    }

    #[test]
    fn test_markets_url_with_category_and_cap() {
        let c = client(Arc::new(MockTransport::new()));
        let mut query = MarketQuery::new(Currency::Eur, SortOrder::PriceAsc, Category::DeFi, 3);
        query.per_page = 1000;
        let url = c.markets_url(&query);
        assert!(url.contains("vs_currency=eur&order=price_asc&per_page=250&page=3"));
        assert!(url.ends_with("&category=decentralized-finance-defi"));
    }

    #[test]
    fn test_search_url_is_encoded() {
        let c = client(Arc::new(MockTransport::new()));
        assert_eq!(
            c.search_url("shiba inu&x"),
            format!("{}/search?query=shiba%20inu%26x", BASE)
        );
    }

    #[tokio::test]
    async fn test_fetch_markets_array() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!([coin_json("bitcoin"), coin_json("ethereum")]));

        let coins = client(transport.clone())
            .fetch_markets(&MarketQuery::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[1].id, "ethereum");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_markets_non_array_is_no_data() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({ "error": "invalid category" }));

        let result = client(transport).fetch_markets(&MarketQuery::default()).await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_fetch_markets_server_error_surfaces() {
        let transport = Arc::new(MockTransport::new());
        transport
            .push_response(400, "")
            .push_response(400, "")
            .push_response(400, "");

        let result = client(transport).fetch_markets(&MarketQuery::default()).await;
        assert_eq!(result, Err(FetchError::Status(400)));
    }

    #[tokio::test]
    async fn test_fetch_total_assets() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({ "data": { "active_cryptocurrencies": 17123 } }));
        transport.push_json(json!({ "status": "weird" }));

        let c = client(transport);
        assert_eq!(c.fetch_total_assets().await, Ok(Some(17123)));
        assert_eq!(c.fetch_total_assets().await, Ok(None));
    }

    #[tokio::test]
    async fn test_search_empty_query_makes_no_request() {
        let transport = Arc::new(MockTransport::new());
        let result = client(transport.clone()).search("   ", Currency::Usd).await;
        assert_eq!(result, Ok(Vec::new()));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_takes_first_ten_ids() {
        let transport = Arc::new(MockTransport::new());
        let hits: Vec<serde_json::Value> = (0..15).map(|i| json!({ "id": format!("coin{}", i) })).collect();
        transport.push_json(json!({ "coins": hits }));
        transport.push_json(json!([coin_json("coin0"), coin_json("coin1")]));

        let coins = client(transport.clone()).search("coin", Currency::Chf).await.unwrap();

        assert_eq!(coins.len(), 2);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].ends_with("/search?query=coin"));
        let expected_ids: Vec<String> = (0..10).map(|i| format!("coin{}", i)).collect();
        assert!(calls[1].contains(&format!("ids={}", expected_ids.join(","))));
        assert!(calls[1].contains("vs_currency=chf"));
        assert!(!calls[1].contains("coin10"));
    }

    #[tokio::test]
    async fn test_search_zero_matches() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({ "coins": [] }));

        let coins = client(transport.clone()).search("zzzz", Currency::Usd).await.unwrap();
        assert!(coins.is_empty());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_chart() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "prices": [[1_700_000_000_000.0, 100.0], [1_700_003_600_000.0, 101.5]],
            "market_caps": []
        }));

        let series = client(transport.clone())
            .fetch_chart("bitcoin", Currency::Usd, LookbackWindow::Week)
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.window, LookbackWindow::Week);
        assert!(transport.calls()[0].ends_with("/coins/bitcoin/market_chart?vs_currency=usd&days=7"));
    }

    #[tokio::test]
    async fn test_fetch_chart_without_prices() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({ "error": "coin not found" }));

        let series = client(transport)
            .fetch_chart("nope", Currency::Usd, LookbackWindow::Day)
            .await
            .unwrap();
        assert!(series.is_empty());
    }
}
