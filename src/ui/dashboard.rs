// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine la table des actifs et route vers les autres écrans
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Table + TableState : lignes avec sélection
// 4. Style : couleurs issues de la Palette du thème courant
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::{format_large, format_price, Coin};
use crate::radio::RadioStation;
use crate::ui::{detail, radio, theme::Palette};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le dashboard est toujours dessiné en fond
/// - Détail et radio viennent par-dessus
///
/// # Arguments
/// * `frame` - Surface de dessin ratatui
/// * `app` - État de l'application
/// * `now_playing` - Station en cours de lecture, s'il y en a une
pub fn render(frame: &mut Frame, app: &App, now_playing: Option<&RadioStation>) {
    let palette = Palette::for_theme(app.theme());
    let chunks = create_layout(frame.size());

    render_header(frame, app, now_playing, &palette, chunks[0]);
    render_table(frame, app, &palette, chunks[1]);

    match app.screen() {
        Screen::SearchInput => render_search_footer(frame, app, &palette, chunks[2]),
        _ => render_footer(frame, app, &palette, chunks[2]),
    }

    match app.screen() {
        Screen::Detail => detail::render_detail(frame, app, &palette),
        Screen::Radio => radio::render_radio(frame, app, now_playing, &palette),
        Screen::Dashboard | Screen::SearchInput => {}
    }
}

/// Header, table, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header : titre + filtres
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : filtres actifs et pagination
// ============================================================================

fn render_header(
    frame: &mut Frame,
    app: &App,
    now_playing: Option<&RadioStation>,
    palette: &Palette,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" CryptoPulse ")
        .title_alignment(Alignment::Center);

    let label = Style::default().fg(palette.muted);
    let value = Style::default().fg(palette.accent).add_modifier(Modifier::BOLD);

    let currency = app.currency();
    let filters = Line::from(vec![
        Span::styled("Devise ", label),
        Span::styled(format!("{} ({})", currency.code().to_uppercase(), currency.symbol()), value),
        Span::styled("   Tri ", label),
        Span::styled(app.sort().label(), value),
        Span::styled("   Catégorie ", label),
        Span::styled(app.category().label(), value),
    ]);

    let mut status = vec![
        Span::styled("Page ", label),
        Span::styled(format!("{}/{}", app.page(), app.max_pages()), value),
        Span::styled(format!("   {} actifs", format_large(app.total_assets() as f64)), label),
    ];
    if app.is_search_active() {
        status.push(Span::styled(
            format!("   Recherche : \"{}\"", app.search_query()),
            Style::default().fg(palette.key),
        ));
    }
    if app.is_loading() {
        status.push(Span::styled(
            "   Chargement...",
            Style::default().fg(palette.key).add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    if let Some(station) = now_playing {
        status.push(Span::styled(format!("   ♪ {}", station.name), Style::default().fg(palette.positive)));
    }

    let paragraph = Paragraph::new(vec![filters, Line::from(status)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Table des actifs
// ============================================================================

/// Ligne de la table pour un actif
fn coin_row<'a>(coin: &'a Coin, favorite: bool, currency_symbol: &str, palette: &Palette) -> Row<'a> {
    let star = if favorite { "★" } else { " " };
    let price = coin
        .current_price
        .map(|p| format!("{}{}", currency_symbol, format_price(p)))
        .unwrap_or_else(|| "N/A".to_string());
    let market_cap = coin
        .market_cap
        .map(|m| format!("{}{}", currency_symbol, format_large(m)))
        .unwrap_or_else(|| "N/A".to_string());

    Row::new(vec![
        Cell::from(star).style(Style::default().fg(palette.favorite)),
        Cell::from(coin.rank_label()).style(Style::default().fg(palette.muted)),
        Cell::from(coin.ticker()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(coin.name.as_str()),
        Cell::from(price),
        Cell::from(coin.change_label()).style(palette.trend(coin.is_positive())),
        Cell::from(market_cap).style(Style::default().fg(palette.muted)),
    ])
    .style(Style::default().fg(palette.text))
}

fn render_table(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let title = if app.is_search_active() {
        " Résultats de recherche "
    } else {
        " Marché "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title);

    let coins = app.display_coins();
    if coins.is_empty() {
        let message = if app.is_loading() {
            "Chargement des données..."
        } else if app.is_search_active() {
            "Aucun résultat"
        } else {
            "Aucune donnée"
        };
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().fg(palette.muted))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let symbol = app.display_currency().symbol();
    let rows: Vec<Row> = coins
        .iter()
        .map(|coin| coin_row(coin, app.is_favorite(&coin.id), symbol, palette))
        .collect();

    let header = Row::new(vec!["", "Rang", "Symbole", "Nom", "Prix", "24h", "Cap."])
        .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Length(2),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(16),
        Constraint::Length(9),
        Constraint::Length(22),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(app.selected_index()));
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Footer : raccourcis ou confirmation de quit
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));

    let key = palette.key_style();
    let line = if app.is_awaiting_quit_confirmation() {
        let warning = Style::default().fg(palette.key).add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", warning),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(palette.negative)
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            ),
            Span::styled(" à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠", warning),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[↑↓]", key),
            Span::raw(" Nav  "),
            Span::styled("[←→]", key),
            Span::raw(" Page  "),
            Span::styled("[Enter]", key),
            Span::raw(" Détail  "),
            Span::styled("[/]", key),
            Span::raw(" Recherche  "),
            Span::styled("[f]", key),
            Span::raw(" Favori  "),
            Span::styled("[c/o/g]", key),
            Span::raw(" Devise/Tri/Catégorie  "),
            Span::styled("[r]", key),
            Span::raw(" Refresh  "),
            Span::styled("[t]", key),
            Span::raw(" Thème  "),
            Span::styled("[p]", key),
            Span::raw(" Radio"),
        ])
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie de recherche
fn render_search_footer(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.positive))
        .title(" Recherche ([Enter] valider, [ESC] annuler) ");

    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
        Span::styled(app.search_query(), Style::default().fg(palette.text)),
        Span::styled("█", Style::default().fg(palette.text).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let paragraph = Paragraph::new(vec![input_line]).block(block);
    frame.render_widget(paragraph, area);
}
