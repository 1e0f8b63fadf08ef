// ============================================================================
// Overlay de détail
// ============================================================================
// Fenêtre centrée par-dessus la table :
// - En-tête : actif, prix, rang, ATH / ATL, site officiel
// - Corps : graphique (fenêtre 24H/7D/30D/1Y) ou rapport complet
// - Pied : analyse courte
//
// CONCEPT RATATUI : Clear
// - Efface la zone avant de dessiner : l'overlay masque la table
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DetailState};
use crate::models::{format_large, format_price, Currency, LookbackWindow};
use crate::ui::{chart, theme::Palette};

/// Rectangle centré occupant un pourcentage de la zone
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Dessine l'overlay si un actif est ouvert
pub fn render_detail(frame: &mut Frame, app: &App, palette: &Palette) {
    let Some(detail) = app.detail() else {
        return;
    };

    let area = centered_rect(90, 90, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(format!(" {} ({}) ", detail.coin.name, detail.coin.ticker()))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Infos
            Constraint::Min(8),    // Graphique ou rapport
            Constraint::Length(5), // Analyse
            Constraint::Length(1), // Raccourcis
        ])
        .split(inner);

    render_summary(frame, detail, detail.currency, palette, chunks[0]);

    if detail.report_mode {
        render_report(frame, detail, palette, chunks[1]);
    } else if detail.is_chart_loading() {
        render_message(frame, "Chargement du graphique...", palette, chunks[1]);
    } else {
        chart::render_price_chart(frame, &detail.chart, detail.currency, palette, chunks[1]);
    }

    render_analysis(frame, detail, palette, chunks[2]);
    render_shortcuts(frame, detail, palette, chunks[3]);
}

/// Prix, variation, rang, extrêmes et site officiel
fn render_summary(frame: &mut Frame, detail: &DetailState, currency: Currency, palette: &Palette, area: Rect) {
    let coin = &detail.coin;
    let symbol = currency.symbol();
    let money = |v: Option<f64>| {
        v.map(|v| format!("{}{}", symbol, format_price(v)))
            .unwrap_or_else(|| "N/A".to_string())
    };
    let label = Style::default().fg(palette.muted);

    let prices = Line::from(vec![
        Span::styled(money(coin.current_price), Style::default().fg(palette.text).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(coin.change_label(), palette.trend(coin.is_positive())),
        Span::styled("   Rang ", label),
        Span::raw(coin.rank_label()),
        Span::styled("   Cap. ", label),
        Span::raw(
            coin.market_cap
                .map(|m| format!("{}{}", symbol, format_large(m)))
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        Span::styled("   ATH ", label),
        Span::raw(money(coin.ath)),
        Span::styled("   ATL ", label),
        Span::raw(money(coin.atl)),
    ]);

    let link = match (&detail.official_link, detail.is_chart_loading()) {
        (Some(uri), _) => Span::styled(uri.clone(), Style::default().fg(palette.accent).add_modifier(Modifier::UNDERLINED)),
        (None, true) => Span::styled("Recherche du site officiel...", label),
        (None, false) => Span::styled("Site officiel introuvable", label),
    };

    let windows: Vec<Span> = LookbackWindow::all()
        .into_iter()
        .flat_map(|w| {
            let style = if w == detail.window {
                Style::default().fg(palette.key).add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                label
            };
            [Span::styled(format!(" {} ", w.label()), style), Span::raw(" ")]
        })
        .collect();

    let mut second = vec![link, Span::raw("   ")];
    second.extend(windows);

    frame.render_widget(Paragraph::new(vec![prices, Line::from(second)]), area);
}

fn render_report(frame: &mut Frame, detail: &DetailState, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" Rapport ");

    let text = match (&detail.report, detail.report_loading) {
        (Some(report), _) => report.clone(),
        (None, true) => "Génération du rapport en cours...".to_string(),
        (None, false) => String::new(),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(palette.text))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_analysis(frame: &mut Frame, detail: &DetailState, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(" Analyse ");

    let (text, style) = match (&detail.analysis, detail.analysis_loading) {
        (Some(analysis), _) => (analysis.as_str(), Style::default().fg(palette.text)),
        (None, true) => ("Analyse en cours...", Style::default().fg(palette.muted)),
        (None, false) => ("[a] pour générer une analyse", Style::default().fg(palette.muted)),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_shortcuts(frame: &mut Frame, detail: &DetailState, palette: &Palette, area: Rect) {
    let key = palette.key_style();
    let report_label = if detail.report_mode { " Graphique  " } else { " Rapport  " };
    let line = Line::from(vec![
        Span::styled("[←→]", key),
        Span::raw(" Fenêtre  "),
        Span::styled("[r]", key),
        Span::raw(report_label),
        Span::styled("[a]", key),
        Span::raw(" Analyse  "),
        Span::styled("[ESC]", key),
        Span::raw(" Retour"),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_message(frame: &mut Frame, message: &str, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(palette.muted).add_modifier(Modifier::SLOW_BLINK),
        )),
    ])
    .block(block)
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(80, 60, area);
        assert_eq!(popup.width, 80);
        assert_eq!(popup.height, 30);
        assert_eq!(popup.x, 10);
        assert_eq!(popup.y, 10);
    }
}
