// ============================================================================
// Structure : OfficialLink
// ============================================================================
// Lien découvert par la recherche "grounded" de Gemini
// ============================================================================

use serde::{Deserialize, Serialize};

/// Titre par défaut d'un lien issu des métadonnées de grounding
pub const GROUNDED_LINK_TITLE: &str = "Site Officiel";

/// Titre d'un lien extrait du texte par regex
pub const SCANNED_LINK_TITLE: &str = "Lien Officiel";

/// Un lien (uri, titre)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialLink {
    pub uri: String,
    pub title: String,
}

impl OfficialLink {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}
