// ============================================================================
// Fetch avec retry
// ============================================================================
// Politique de retry séquentielle, sensible au rate limiting
//
// Règles :
// - HTTP 429 : attend 2000ms × (tentative + 1) puis réessaie
// - Autre échec (statut, réseau, JSON illisible) : attend 1000ms puis
//   réessaie ; à la dernière tentative, l'erreur remonte à l'appelant
// - Succès : corps JSON parsé
//
// CONCEPTS RUST :
// 1. Politique = donnée : RetryPolicy est une petite struct Copy
// 2. Horloge injectée : trait Sleeper, pour tester sans attendre
// 3. Closure qui retourne une Future : la même boucle sert pour GET et POST
// ============================================================================

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::api::transport::{HttpResponse, HttpTransport};
use crate::config::DEFAULT_MAX_RETRIES;
use crate::error::FetchError;

// ============================================================================
// Horloge
// ============================================================================

/// Attente asynchrone injectable
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Horloge réelle (tokio::time)
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Politique de retry
// ============================================================================

/// Nature d'un échec, qui détermine le délai avant la tentative suivante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429
    RateLimited,
    /// Tout le reste
    Failure,
}

impl FailureKind {
    fn of(error: &FetchError) -> Self {
        match error {
            FetchError::RateLimited => FailureKind::RateLimited,
            _ => FailureKind::Failure,
        }
    }
}

/// Politique de retry : nombre de tentatives et délais par type d'échec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives (≥ 1)
    pub max_attempts: u32,

    /// Pas du backoff linéaire sur 429
    pub rate_limit_step: Duration,

    /// Délai fixe après un autre échec
    pub failure_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            rate_limit_step: Duration::from_millis(2000),
            failure_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Une seule tentative, aucun délai
    pub fn no_retry() -> Self {
        Self::with_max_attempts(1)
    }

    /// Délai à attendre après l'échec de la tentative `attempt` (base 0)
    pub fn delay_for(&self, kind: FailureKind, attempt: u32) -> Duration {
        match kind {
            FailureKind::RateLimited => self.rate_limit_step * (attempt + 1),
            FailureKind::Failure => self.failure_delay,
        }
    }

    fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }

    /// Exécute `request` selon la politique et parse le corps en JSON
    ///
    /// Les 429 ne comptent pas comme échec "dur" : tant qu'il reste des
    /// tentatives, on attend puis on réessaie. Si toutes les tentatives ont
    /// été rate-limitées, retourne `FetchError::RateLimited`.
    pub async fn execute<F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut request: F,
    ) -> Result<serde_json::Value, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<HttpResponse, FetchError>>,
    {
        for attempt in 0..self.max_attempts.max(1) {
            let outcome = match request().await {
                Ok(response) if response.is_rate_limited() => Err(FetchError::RateLimited),
                Ok(response) if response.is_success() => {
                    serde_json::from_str::<serde_json::Value>(&response.body).map_err(FetchError::from)
                }
                Ok(response) => Err(FetchError::Status(response.status)),
                Err(e) => Err(e),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let kind = FailureKind::of(&error);
            if self.is_last(attempt) {
                error!(attempt = attempt + 1, error = %error, "Request failed, no attempts left");
                return Err(error);
            }

            let delay = self.delay_for(kind, attempt);
            match kind {
                FailureKind::RateLimited => {
                    warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "Rate limited, backing off")
                }
                FailureKind::Failure => {
                    warn!(attempt = attempt + 1, error = %error, delay_ms = delay.as_millis() as u64, "Request failed, retrying")
                }
            }
            sleeper.sleep(delay).await;
        }

        Err(FetchError::RateLimited)
    }
}

/// GET `url` avec retry et retourne le corps JSON
pub async fn fetch_json(
    transport: &dyn HttpTransport,
    sleeper: &dyn Sleeper,
    policy: &RetryPolicy,
    url: &str,
) -> Result<serde_json::Value, FetchError> {
    debug!(url = %url, "GET");
    policy.execute(sleeper, || transport.get(url)).await
}

// ============================================================================
// Mock pour les tests
// ============================================================================


// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::mock::MockSleeper;
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use serde_json::json;

    const URL: &str = "https://api.example.com/data";

    #[test]
    fn test_delay_for() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(FailureKind::RateLimited, 0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(FailureKind::RateLimited, 2), Duration::from_millis(6000));
        assert_eq!(policy.delay_for(FailureKind::Failure, 2), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let transport = MockTransport::new();
        transport.push_json(json!([1, 2, 3]));
        let sleeper = MockSleeper::new();

        let value = fetch_json(&transport, &sleeper, &RetryPolicy::default(), URL)
            .await
            .unwrap();

        assert_eq!(value, json!([1, 2, 3]));
        assert_eq!(transport.call_count(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_then_success_backs_off_linearly() {
        let transport = MockTransport::new();
        transport
            .push_response(429, "")
            .push_response(429, "")
            .push_json(json!({"ok": true}));
        let sleeper = MockSleeper::new();

        let value = fetch_json(&transport, &sleeper, &RetryPolicy::default(), URL)
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert_eq!(transport.call_count(), 3);
        // k-ème retry : 2000 × k ms
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test]
    async fn test_failures_retry_then_propagate() {
        let transport = MockTransport::new();
        transport
            .push_response(500, "oops")
            .push_error(FetchError::Transport("connection reset".to_string()))
            .push_response(503, "");
        let sleeper = MockSleeper::new();

        let result = fetch_json(&transport, &sleeper, &RetryPolicy::default(), URL).await;

        assert_eq!(result, Err(FetchError::Status(503)));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_failure_then_success() {
        let transport = MockTransport::new();
        transport.push_response(502, "").push_json(json!("fine"));
        let sleeper = MockSleeper::new();

        let value = fetch_json(&transport, &sleeper, &RetryPolicy::default(), URL)
            .await
            .unwrap();

        assert_eq!(value, json!("fine"));
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_failure() {
        let transport = MockTransport::new();
        transport.push_response(200, "<html>").push_response(200, "not json");
        let sleeper = MockSleeper::new();

        let result = fetch_json(&transport, &sleeper, &RetryPolicy::with_max_attempts(2), URL).await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_on_every_attempt() {
        let transport = MockTransport::new();
        transport
            .push_response(429, "")
            .push_response(429, "")
            .push_response(429, "");
        let sleeper = MockSleeper::new();

        let result = fetch_json(&transport, &sleeper, &RetryPolicy::default(), URL).await;

        assert_eq!(result, Err(FetchError::RateLimited));
        assert_eq!(transport.call_count(), 3);
        // Pas d'attente après la dernière tentative
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let transport = MockTransport::new();
        transport.push_response(500, "");
        let sleeper = MockSleeper::new();

        let result = fetch_json(&transport, &sleeper, &RetryPolicy::no_retry(), URL).await;

        assert_eq!(result, Err(FetchError::Status(500)));
        assert!(sleeper.delays().is_empty());
    }
}
