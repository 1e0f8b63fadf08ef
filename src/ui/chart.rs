// ============================================================================
// Chart - Graphique ligne d'une série de prix
// ============================================================================
// CONCEPTS RUST :
// 1. Option handling : série vide ou bornes absentes
// 2. Iterator chaining : PricePoint → points (x, y)
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::models::{format_price, ChartSeries, Currency};
use crate::ui::theme::Palette;

/// Points (x, y) du graphique : x = index, y = prix
pub fn chart_points(series: &ChartSeries) -> Vec<(f64, f64)> {
    series
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.price))
        .collect()
}

/// Bornes de l'axe Y avec 5% de marge
///
/// Une série plate garde une hauteur non nulle.
pub fn y_bounds(min: f64, max: f64) -> (f64, f64) {
    let margin = if max > min { (max - min) * 0.05 } else { max.abs() * 0.01 + 1e-9 };
    ((min - margin).max(0.0), max + margin)
}

/// Dessine le graphique ligne de la série
pub fn render_price_chart(
    frame: &mut Frame,
    series: &ChartSeries,
    currency: Currency,
    palette: &Palette,
    area: Rect,
) {
    let title = format!(" {} ", series.window.label());
    let Some((min_price, max_price)) = series.price_bounds() else {
        render_empty(frame, palette, &title, area);
        return;
    };

    let points = chart_points(series);
    let (y_min, y_max) = y_bounds(min_price, max_price);

    // Couleur selon la tendance sur la fenêtre
    let positive = series.change_percent().map(|c| c >= 0.0).unwrap_or(true);
    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(palette.trend(positive))
        .data(&points)];

    let time_format = if series.window.days() <= 1 { "%H:%M" } else { "%d/%m" };
    let x_labels: Vec<Span> = [series.first(), series.last()]
        .into_iter()
        .flatten()
        .map(|p| Span::raw(p.time.format(time_format).to_string()))
        .collect();

    let x_axis = Axis::default()
        .style(Style::default().fg(palette.muted))
        .bounds([0.0, (points.len().saturating_sub(1)).max(1) as f64])
        .labels(x_labels);

    let symbol = currency.symbol();
    let y_axis = Axis::default()
        .style(Style::default().fg(palette.muted))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{}{}", symbol, format_price(y_min))),
            Span::raw(format!("{}{}", symbol, format_price((y_min + y_max) / 2.0))),
            Span::raw(format!("{}{}", symbol, format_price(y_max))),
        ]);

    let change = series
        .change_percent()
        .map(|c| format!(" {} ({:+.2}%) ", series.window.label(), c))
        .unwrap_or(title);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border))
                .title(change),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Série vide : fetch échoué ou aucun point
fn render_empty(frame: &mut Frame, palette: &Palette, title: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title.to_string());

    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Pas de données à afficher",
            Style::default().fg(palette.muted),
        )),
    ])
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
