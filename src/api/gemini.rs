// ============================================================================
// API Client : Gemini (génération de texte)
// ============================================================================
// Trois enrichissements indépendants et facultatifs pour un actif :
// 1. Analyse courte (3 phrases)
// 2. Rapport complet structuré (avec recherche Google)
// 3. Découverte du site officiel (recherche "grounded")
//
// Aucun de ces appels ne doit bloquer l'affichage : en cas d'échec, les
// deux premiers renvoient un texte de repli, le troisième une liste vide.
//
// CONCEPTS RUST :
// 1. serde rename_all = "camelCase" : mapping du JSON Google
// 2. Fonctions pures pour les prompts et l'extraction : testables sans réseau
// 3. Regex en repli quand les métadonnées de grounding sont absentes
// ============================================================================

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::api::retry::{RetryPolicy, TokioSleeper};
use crate::api::transport::HttpTransport;
use crate::error::GenerativeError;
use crate::models::report::{GROUNDED_LINK_TITLE, SCANNED_LINK_TITLE};
use crate::models::{Coin, OfficialLink};

pub const ANALYSIS_MODEL: &str = "gemini-3-flash-preview";
pub const REPORT_MODEL: &str = "gemini-3-pro-preview";
pub const LINKS_MODEL: &str = "gemini-3-pro-preview";

pub const ANALYSIS_UNAVAILABLE: &str = "Analyse indisponible.";
pub const ANALYSIS_FAILED: &str = "Erreur lors de la génération de l'analyse.";
pub const REPORT_UNAVAILABLE: &str = "Le rapport profond est temporairement indisponible.";
pub const REPORT_FAILED: &str = "Échec de la synchronisation du rapport profond.";

/// Nombre maximal de liens extraits du texte en repli
const SCANNED_LINK_LIMIT: usize = 2;

/// En-tête portant la clé API (jamais dans l'URL, qui finit dans les logs)
pub const API_KEY_HEADER: &str = "x-goog-api-key";

// Compilée une seule fois ; le motif est une constante valide
static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid link pattern"));

// ============================================================================
// Requête
// ============================================================================

/// Une requête generateContent
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: &'static str,
    pub prompt: String,
    /// Active l'outil google_search
    pub grounded: bool,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    /// Corps JSON de l'appel
    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": self.prompt }] }]
        });
        if self.grounded {
            body["tools"] = json!([{ "google_search": {} }]);
        }
        if let Some(temperature) = self.temperature {
            body["generationConfig"] = json!({ "temperature": temperature });
        }
        body
    }
}

// ============================================================================
// Réponse
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateResponse {
    /// Texte concaténé du premier candidat (None si vide)
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Liens des métadonnées de grounding du premier candidat
    fn grounded_links(&self) -> Vec<OfficialLink> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        let uri = web.uri.as_deref().filter(|u| !u.is_empty())?;
                        let title = web
                            .title
                            .clone()
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| GROUNDED_LINK_TITLE.to_string());
                        Some(OfficialLink::new(uri, title))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Liens d'une réponse : grounding d'abord, sinon URLs trouvées dans le texte
pub fn extract_links(response: &GenerateResponse) -> Vec<OfficialLink> {
    let links = response.grounded_links();
    if !links.is_empty() {
        return links;
    }
    response
        .text()
        .map(|text| scan_links(&text))
        .unwrap_or_default()
}

/// Extrait au plus deux URLs http(s) d'un texte libre
///
/// La ponctuation finale (`.`, `,`, `)`) est retirée.
pub fn scan_links(text: &str) -> Vec<OfficialLink> {
    LINK_PATTERN
        .find_iter(text)
        .take(SCANNED_LINK_LIMIT)
        .map(|m| {
            let uri = m.as_str().trim_end_matches(&['.', ',', ')'][..]);
            OfficialLink::new(uri, SCANNED_LINK_TITLE)
        })
        .collect()
}

// ============================================================================
// Prompts
// ============================================================================

fn money(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", v),
        None => "N/A".to_string(),
    }
}

pub fn analysis_prompt(coin: &Coin) -> String {
    format!(
        "Analyses cette crypto-monnaie: {} ({}). Prix actuel: {}. Record Historique (ATH): {}. \
         Record Minimum (ATL): {}. Capitalisation: {}. Fournis un résumé ultra-rapide en 3 phrases \
         maximum sur son potentiel et son état actuel. Utilise un ton professionnel mais dynamique.",
        coin.name,
        coin.ticker(),
        money(coin.current_price),
        money(coin.ath),
        money(coin.atl),
        money(coin.market_cap),
    )
}

pub fn report_prompt(coin: &Coin) -> String {
    format!(
        "Effectue un rapport d'analyse COMPLET et DÉTAILLÉ pour la crypto-monnaie {} ({}). \
         Structure le rapport avec ces sections : MISSION ET UTILITÉ, TOKENOMICS, POSITION SUR LE MARCHÉ, \
         DÉVELOPPEMENTS RÉCENTS, ANALYSE DES RISQUES, PERSPECTIVES DE CROISSANCE. \
         Utilise un style \"Terminal Quantum\" et des informations récentes.",
        coin.name,
        coin.ticker(),
    )
}

pub fn links_prompt(coin: &Coin) -> String {
    format!(
        "Trouve l'URL du site web officiel principal de la crypto-monnaie {} ({}).",
        coin.name,
        coin.ticker(),
    )
}

// ============================================================================
// Client
// ============================================================================

/// Client Gemini
#[derive(Clone)]
pub struct ReportClient {
    base_url: String,
    api_key: Option<String>,
    transport: Arc<dyn HttpTransport>,
}

impl ReportClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            transport,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Appel generateContent brut, une seule tentative
    #[instrument(skip(self, request), fields(model = request.model, grounded = request.grounded))]
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerativeError> {
        let key = self.api_key.as_deref().ok_or(GenerativeError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let headers = [(API_KEY_HEADER, key)];
        let body = request.body();

        debug!(prompt_len = request.prompt.len(), "Calling generative model");
        let value = RetryPolicy::no_retry()
            .execute(&TokioSleeper, || self.transport.post_json(&url, &headers, &body))
            .await?;

        let response: GenerateResponse = serde_json::from_value(value)
            .map_err(|e| GenerativeError::Fetch(e.into()))?;
        Ok(response)
    }

    /// Analyse courte (3 phrases), texte de repli en cas d'échec
    pub async fn analysis(&self, coin: &Coin) -> String {
        let request = GenerateRequest {
            model: ANALYSIS_MODEL,
            prompt: analysis_prompt(coin),
            grounded: false,
            temperature: Some(0.7),
        };
        match self.generate(&request).await {
            Ok(response) => response.text().unwrap_or_else(|| ANALYSIS_UNAVAILABLE.to_string()),
            Err(e) => {
                error!(coin = %coin.id, error = %e, "Analysis generation failed");
                ANALYSIS_FAILED.to_string()
            }
        }
    }

    /// Rapport complet structuré, texte de repli en cas d'échec
    pub async fn deep_report(&self, coin: &Coin) -> String {
        let request = GenerateRequest {
            model: REPORT_MODEL,
            prompt: report_prompt(coin),
            grounded: true,
            temperature: Some(0.4),
        };
        match self.generate(&request).await {
            Ok(response) => {
                let text = response.text();
                info!(coin = %coin.id, generated = text.is_some(), "Deep report generated");
                text.unwrap_or_else(|| REPORT_UNAVAILABLE.to_string())
            }
            Err(e) => {
                error!(coin = %coin.id, error = %e, "Deep report generation failed");
                REPORT_FAILED.to_string()
            }
        }
    }

    /// Liens officiels, liste vide en cas d'échec
    pub async fn official_links(&self, coin: &Coin) -> Vec<OfficialLink> {
        let request = GenerateRequest {
            model: LINKS_MODEL,
            prompt: links_prompt(coin),
            grounded: true,
            temperature: None,
        };
        match self.generate(&request).await {
            Ok(response) => {
                let links = extract_links(&response);
                debug!(coin = %coin.id, count = links.len(), "Official links extracted");
                links
            }
            Err(e) => {
                warn!(coin = %coin.id, error = %e, "Official link lookup failed");
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::api::transport::ReqwestTransport;
    use crate::error::FetchError;

    fn bitcoin() -> Coin {
        let mut coin = Coin::new("bitcoin", "Bitcoin", "btc");
        coin.current_price = Some(67000.0);
        coin
    }

    fn client(transport: Arc<MockTransport>) -> ReportClient {
        ReportClient::new("https://gemini.test/v1beta", Some("k".to_string()), transport)
    }

    fn response(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_body() {
        let request = GenerateRequest {
            model: REPORT_MODEL,
            prompt: "hello".to_string(),
            grounded: true,
            temperature: Some(0.4),
        };
        let body = request.body();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert!(body["tools"][0].get("google_search").is_some());
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);

        let plain = GenerateRequest { grounded: false, temperature: None, ..request }.body();
        assert!(plain.get("tools").is_none());
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn test_prompts_mention_coin() {
        let coin = bitcoin();
        assert!(analysis_prompt(&coin).contains("Bitcoin (BTC)"));
        assert!(analysis_prompt(&coin).contains("Prix actuel: $67000"));
        assert!(analysis_prompt(&coin).contains("ATL): N/A"));
        assert!(report_prompt(&coin).contains("TOKENOMICS"));
        assert!(links_prompt(&coin).contains("site web officiel"));
    }

    #[test]
    fn test_extract_links_prefers_grounding() {
        let r = response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "See https://ignored.example" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://bitcoin.org", "title": "bitcoin.org" } },
                    { "web": { "uri": "https://vertex.example/redirect" } },
                    { "retrievedContext": {} }
                ]}
            }]
        }));

        let links = extract_links(&r);
        assert_eq!(
            links,
            vec![
                OfficialLink::new("https://bitcoin.org", "bitcoin.org"),
                OfficialLink::new("https://vertex.example/redirect", GROUNDED_LINK_TITLE),
            ]
        );
    }

    #[test]
    fn test_extract_links_falls_back_to_text() {
        let r = response(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Le site officiel est https://ethereum.org. " },
                    { "text": "Voir aussi (https://docs.example.com/x), et http://third.example" }
                ]}
            }]
        }));

        let links = extract_links(&r);
        assert_eq!(
            links,
            vec![
                OfficialLink::new("https://ethereum.org", SCANNED_LINK_TITLE),
                OfficialLink::new("https://docs.example.com/x", SCANNED_LINK_TITLE),
            ]
        );
    }

    #[test]
    fn test_empty_response() {
        let r = GenerateResponse::default();
        assert!(r.text().is_none());
        assert!(extract_links(&r).is_empty());
    }

    #[tokio::test]
    async fn test_analysis_success() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Solide." }] } }]
        }));

        let text = client(transport.clone()).analysis(&bitcoin()).await;

        assert_eq!(text, "Solide.");
        let calls = transport.calls();
        assert_eq!(calls[0], "https://gemini.test/v1beta/models/gemini-3-flash-preview:generateContent");
        assert_eq!(
            transport.posted_headers()[0],
            vec![(API_KEY_HEADER.to_string(), "k".to_string())]
        );
        assert!(transport.posted_bodies()[0].get("tools").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_error_hides_key() {
        let transport = Arc::new(ReqwestTransport::new().unwrap());
        let c = ReportClient::new("http://127.0.0.1:1/v1beta", Some("SECRETKEY123".to_string()), transport);
        let request = GenerateRequest {
            model: ANALYSIS_MODEL,
            prompt: "ping".to_string(),
            grounded: false,
            temperature: None,
        };

        let error = c.generate(&request).await.unwrap_err();

        assert!(matches!(error, GenerativeError::Fetch(FetchError::Transport(_))));
        assert!(!error.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", error).contains("SECRETKEY123"));
    }

    #[test]
    fn test_scan_links_reuses_pattern() {
        let first = scan_links("voir https://a.example.");
        let second = scan_links("pas de lien ici");
        let third = scan_links("https://b.example, https://c.example) https://d.example");

        assert_eq!(first, vec![OfficialLink::new("https://a.example", SCANNED_LINK_TITLE)]);
        assert!(second.is_empty());
        assert_eq!(
            third,
            vec![
                OfficialLink::new("https://b.example", SCANNED_LINK_TITLE),
                OfficialLink::new("https://c.example", SCANNED_LINK_TITLE),
            ]
        );
    }

    #[tokio::test]
    async fn test_placeholders_on_failure() {
        let transport = Arc::new(MockTransport::new());
        transport
            .push_response(500, "")
            .push_error(FetchError::Transport("down".to_string()))
            .push_json(json!({ "candidates": [] }));

        let c = client(transport.clone());
        assert_eq!(c.analysis(&bitcoin()).await, ANALYSIS_FAILED);
        assert_eq!(c.deep_report(&bitcoin()).await, REPORT_FAILED);
        assert_eq!(c.deep_report(&bitcoin()).await, REPORT_UNAVAILABLE);
        // Une seule tentative par appel
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let transport = Arc::new(MockTransport::new());
        let c = ReportClient::new("https://gemini.test/v1beta", None, transport.clone());

        assert!(c.official_links(&bitcoin()).await.is_empty());
        assert_eq!(c.analysis(&bitcoin()).await, ANALYSIS_FAILED);
        assert_eq!(transport.call_count(), 0);
    }
}
