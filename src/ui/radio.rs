// ============================================================================
// Panneau radio
// ============================================================================
// Liste des stations, station en cours marquée ▶
// ============================================================================

use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Clear, List, ListItem, ListState,
    },
    Frame,
};

use crate::app::App;
use crate::radio::{RadioStation, STATIONS};
use crate::ui::{detail::centered_rect, theme::Palette};

pub fn render_radio(frame: &mut Frame, app: &App, now_playing: Option<&RadioStation>, palette: &Palette) {
    let area = centered_rect(50, 40, frame.size());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = STATIONS
        .iter()
        .map(|station| {
            let playing = now_playing == Some(station);
            let marker = if playing { "▶ " } else { "  " };
            let style = if playing {
                Style::default().fg(palette.positive).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            ListItem::new(Line::from(vec![Span::raw(marker), Span::styled(station.name, style)]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Radio ")
        .title_alignment(Alignment::Center)
        .title(Title::from(" [Enter] Jouer  [s] Stop  [ESC] Retour ").position(Position::Bottom));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default().with_selected(Some(app.radio_cursor()));
    frame.render_stateful_widget(list, area, &mut state);
}
