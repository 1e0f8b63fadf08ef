// ============================================================================
// Palette de couleurs
// ============================================================================
// Traduit le Theme de l'état (Dark / Light) en couleurs ratatui.
// Tous les écrans passent par ici : basculer le thème recolore tout.
// ============================================================================

use ratatui::style::{Color, Modifier, Style};

use crate::models::Theme;

/// Couleurs d'un thème
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub border: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub key: Color,
    pub positive: Color,
    pub negative: Color,
    pub favorite: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                border: Color::Cyan,
                text: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                key: Color::Yellow,
                positive: Color::Green,
                negative: Color::Red,
                favorite: Color::Yellow,
            },
            Theme::Light => Self {
                border: Color::Blue,
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                key: Color::Magenta,
                positive: Color::Green,
                negative: Color::Red,
                favorite: Color::Magenta,
            },
        }
    }

    /// Vert ou rouge selon le signe
    pub fn trend(&self, positive: bool) -> Style {
        Style::default().fg(if positive { self.positive } else { self.negative })
    }

    /// Style des raccourcis clavier dans les footers
    pub fn key_style(&self) -> Style {
        Style::default().fg(self.key).add_modifier(Modifier::BOLD)
    }
}
