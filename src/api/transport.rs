// ============================================================================
// Transport HTTP
// ============================================================================
// Abstraction minimale au-dessus de reqwest
//
// CONCEPTS RUST :
// 1. Trait async (async-trait) : point d'injection pour les tests
// 2. Arc<dyn Trait> : un transport partagé entre toutes les tâches
// 3. Le statut HTTP est une donnée, pas une erreur : c'est la politique de
//    retry qui décide quoi faire d'un 429 ou d'un 500
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::FetchError;

/// Réponse HTTP brute
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Statut 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport HTTP injectable
///
/// Une erreur `Err` signifie un échec réseau ; tout statut reçu du serveur
/// est renvoyé dans `Ok(HttpResponse)`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;

    /// POST JSON ; `headers` porte les en-têtes propres à l'appel (clé API)
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, FetchError>;
}

/// Transport de production basé sur reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, FetchError> {
        let status = response.status().as_u16();
        debug!(status, "Received HTTP response");
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, FetchError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;
        Self::read(response).await
    }
}

// ============================================================================
// Mock pour les tests
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport scripté : renvoie les réponses dans l'ordre d'enregistrement
    /// et mémorise chaque URL appelée
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
        calls: Mutex<Vec<String>>,
        bodies: Mutex<Vec<serde_json::Value>>,
        headers: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, status: u16, body: impl Into<String>) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse::new(status, body)));
            self
        }

        pub fn push_json(&self, body: serde_json::Value) -> &Self {
            self.push_response(200, body.to_string())
        }

        pub fn push_error(&self, error: FetchError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn posted_bodies(&self) -> Vec<serde_json::Value> {
            self.bodies.lock().unwrap().clone()
        }

        /// En-têtes de chaque POST, dans l'ordre des appels
        pub fn posted_headers(&self) -> Vec<Vec<(String, String)>> {
            self.headers.lock().unwrap().clone()
        }

        fn next(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("no scripted response".to_string())))
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.next(url)
        }

        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: &serde_json::Value,
        ) -> Result<HttpResponse, FetchError> {
            self.bodies.lock().unwrap().push(body.clone());
            self.headers.lock().unwrap().push(
                headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            );
            self.next(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(429, "").is_success());
        assert!(HttpResponse::new(429, "").is_rate_limited());
        assert!(!HttpResponse::new(500, "").is_rate_limited());
    }

    #[tokio::test]
    async fn test_network_error_hides_url() {
        // Port 1 : connexion refusée immédiatement
        let transport = ReqwestTransport::new().unwrap();
        let error = transport
            .post_json(
                "http://127.0.0.1:1/v1beta/models/m:generateContent?key=SECRETKEY123",
                &[],
                &serde_json::json!({}),
            )
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::Transport(_)));
        assert!(!error.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", error).contains("SECRETKEY123"));
    }
}
