// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients HTTP : CoinGecko (données de marché) et
// Gemini (textes générés), ainsi que le transport et la politique de retry
// qu'ils partagent.
// ============================================================================

pub mod coingecko; // Liste, stats globales, recherche, graphiques
pub mod gemini;    // Analyse, rapport, liens officiels
pub mod retry;     // Fetch avec retry et backoff
pub mod transport; // Abstraction HTTP (reqwest)

// Re-export des types principaux
pub use coingecko::{MarketClient, MarketQuery};
pub use gemini::ReportClient;
pub use retry::{fetch_json, RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
