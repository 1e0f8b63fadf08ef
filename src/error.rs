//! Types d'erreurs des clients HTTP

use thiserror::Error;

/// Échec d'un appel HTTP vers CoinGecko ou Gemini
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// Erreur réseau (connexion, timeout, DNS...)
    #[error("Erreur réseau : {0}")]
    Transport(String),

    /// HTTP 429 sur toutes les tentatives
    #[error("Limite de requêtes atteinte")]
    RateLimited,

    /// Statut HTTP hors 2xx (autre que 429)
    #[error("Erreur HTTP : {0}")]
    Status(u16),

    /// Corps de réponse illisible
    #[error("Réponse invalide : {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    // L'URL peut porter des secrets : on ne garde que la cause
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Échec d'un appel au service de génération de texte
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerativeError {
    /// Aucune clé API configurée
    #[error("Clé API Gemini absente")]
    MissingApiKey,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Réponse sans texte exploitable
    #[error("Réponse vide du modèle")]
    EmptyResponse,
}
