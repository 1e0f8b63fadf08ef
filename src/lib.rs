// ============================================================================
// CryptoPulse - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;    // Clients CoinGecko et Gemini
pub mod app;    // État de l'application
pub mod config; // Configuration (env + .env)
pub mod error;  // Erreurs typées
pub mod models; // Structures de données
pub mod radio;  // Lecteur de radios internet
pub mod ui;     // Interface utilisateur
pub mod worker; // Exécution des requêtes hors du thread UI
