// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;     // Graphique ligne d'une série de prix
pub mod dashboard; // Table des actifs, routage des écrans
pub mod detail;    // Overlay de détail : graphique ou rapport
pub mod events;    // Gestion des événements clavier
pub mod radio;     // Liste des radios
pub mod theme;     // Palette Dark / Light

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
