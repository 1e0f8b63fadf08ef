// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Polling avec timeout : la boucle reste vivante sans entrée clavier
// 3. Error handling avec Result
//
// RACCOURCIS :
//   Dashboard : ↑↓/jk naviguer, ←→/hl page, Enter détail, / recherche,
//               x effacer recherche, f favori, c devise, o tri,
//               g catégorie, r rafraîchir, t thème, p radio, q quitter
//   Détail    : ←→/hl fenêtre, r rapport, a analyse, ESC/Espace fermer
//   Radio     : ↑↓ station, Enter jouer, s stop, ESC retour
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (rafraîchissement, résultats du worker)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Crée un gestionnaire avec un tick de 250ms
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - Si pas d'événement avant le tick, retourne Ok(Event::Tick)
    /// - Seuls les Press sont remontés (certains OS envoient aussi Release)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : KeyEvent → action
// ============================================================================
// CONCEPT RUST : Pattern matching avec matches!
// - Un helper par action, l'event loop reste lisible
// ============================================================================

/// Code de touche si l'événement est clavier
fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// Vrai si la touche est l'un des caractères donnés
fn is_char(event: &Event, chars: &[char]) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if chars.contains(&c))
}

/// 'q' : quitter
pub fn is_quit_event(event: &Event) -> bool {
    is_char(event, &['q', 'Q'])
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_space_event(event: &Event) -> bool {
    is_char(event, &[' '])
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up)) || is_char(event, &['k', 'K'])
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down)) || is_char(event, &['j', 'J'])
}

/// Flèche gauche ou 'h' : page / fenêtre précédente
pub fn is_left_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left)) || is_char(event, &['h'])
}

/// Flèche droite ou 'l' : page / fenêtre suivante
pub fn is_right_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right)) || is_char(event, &['l'])
}

/// '/' : ouvrir la saisie de recherche
pub fn is_search_event(event: &Event) -> bool {
    is_char(event, &['/'])
}

/// 'x' : effacer la recherche
pub fn is_clear_search_event(event: &Event) -> bool {
    is_char(event, &['x', 'X'])
}

/// 'f' : basculer le favori
pub fn is_favorite_event(event: &Event) -> bool {
    is_char(event, &['f', 'F'])
}

/// 'c' : devise suivante
pub fn is_currency_event(event: &Event) -> bool {
    is_char(event, &['c', 'C'])
}

/// 'o' : ordre de tri suivant
pub fn is_sort_event(event: &Event) -> bool {
    is_char(event, &['o', 'O'])
}

/// 'g' : catégorie suivante
pub fn is_category_event(event: &Event) -> bool {
    is_char(event, &['g', 'G'])
}

/// 'r' : rafraîchir (dashboard) ou rapport (détail)
pub fn is_refresh_event(event: &Event) -> bool {
    is_char(event, &['r', 'R'])
}

/// 'a' : analyse courte
pub fn is_analysis_event(event: &Event) -> bool {
    is_char(event, &['a', 'A'])
}

/// 't' : thème clair / sombre
pub fn is_theme_event(event: &Event) -> bool {
    is_char(event, &['t', 'T'])
}

/// 'p' : écran radio
pub fn is_radio_event(event: &Event) -> bool {
    is_char(event, &['p', 'P'])
}

/// 's' : arrêter la radio
pub fn is_stop_event(event: &Event) -> bool {
    is_char(event, &['s', 'S'])
}

/// Caractère imprimable pour la saisie de recherche
pub fn is_text_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if !c.is_control())
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_arrows_and_vim_keys() {
        assert!(is_up_event(&key(KeyCode::Up)));
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(is_down_event(&key(KeyCode::Char('j'))));
        assert!(is_left_event(&key(KeyCode::Left)));
        assert!(is_right_event(&key(KeyCode::Char('l'))));
        assert!(!is_right_event(&key(KeyCode::Char('L'))));
    }

    #[test]
    fn test_text_chars() {
        assert!(is_text_char_event(&key(KeyCode::Char('é'))));
        assert!(is_text_char_event(&key(KeyCode::Char(' '))));
        assert!(!is_text_char_event(&key(KeyCode::Enter)));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('b'))), Some('b'));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }
}
