// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod chart;     // Série de prix et fenêtre de lookback
pub mod coin;      // Actif de la liste de marché
pub mod report;    // Liens officiels (Gemini)
pub mod selection; // Devise, tri, catégorie, thème

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use cryptopulse::models::coin::Coin;
// On peut faire : use cryptopulse::models::Coin;
pub use chart::{ChartSeries, LookbackWindow, PricePoint};
pub use coin::{format_large, format_price, Coin};
pub use report::OfficialLink;
pub use selection::{Category, Currency, SortOrder, Theme};
