// ============================================================================
// Structure : ChartSeries
// ============================================================================
// Série temporelle de prix pour un actif et une fenêtre donnés
//
// CONCEPTS RUST :
// 1. DateTime<Utc> : timestamps convertis depuis les millisecondes Unix
// 2. Iterator fold : min/max en un seul passage
// 3. Enum avec données numériques : fenêtre de lookback en jours
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fenêtre de lookback du graphique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackWindow {
    /// 24 heures (fenêtre ouverte par défaut)
    Day,
    Week,
    Month,
    Year,
}

impl LookbackWindow {
    pub fn all() -> Vec<LookbackWindow> {
        vec![
            LookbackWindow::Day,
            LookbackWindow::Week,
            LookbackWindow::Month,
            LookbackWindow::Year,
        ]
    }

    /// Valeur du paramètre `days`
    pub fn days(&self) -> u32 {
        match self {
            LookbackWindow::Day => 1,
            LookbackWindow::Week => 7,
            LookbackWindow::Month => 30,
            LookbackWindow::Year => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookbackWindow::Day => "24H",
            LookbackWindow::Week => "7D",
            LookbackWindow::Month => "30D",
            LookbackWindow::Year => "1Y",
        }
    }

    /// Fenêtre suivante (24H → 7D → 30D → 1Y → 24H)
    pub fn next(&self) -> LookbackWindow {
        match self {
            LookbackWindow::Day => LookbackWindow::Week,
            LookbackWindow::Week => LookbackWindow::Month,
            LookbackWindow::Month => LookbackWindow::Year,
            LookbackWindow::Year => LookbackWindow::Day,
        }
    }

    pub fn previous(&self) -> LookbackWindow {
        match self {
            LookbackWindow::Day => LookbackWindow::Year,
            LookbackWindow::Week => LookbackWindow::Day,
            LookbackWindow::Month => LookbackWindow::Week,
            LookbackWindow::Year => LookbackWindow::Month,
        }
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        LookbackWindow::Day
    }
}

/// Un point (timestamp, prix)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Série de prix d'un actif, remplacée en bloc à chaque fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Identifiant de l'actif
    pub coin_id: String,

    pub window: LookbackWindow,

    /// Points triés par timestamp croissant (ordre de l'API)
    pub points: Vec<PricePoint>,
}

impl ChartSeries {
    pub fn new(coin_id: String, window: LookbackWindow) -> Self {
        Self {
            coin_id,
            window,
            points: Vec::new(),
        }
    }

    /// Construit une série depuis les paires brutes `[ms, prix]` de CoinGecko
    ///
    /// Les paires incomplètes ou aux timestamps invalides sont ignorées.
    pub fn from_raw_pairs(coin_id: String, window: LookbackWindow, pairs: &[Vec<f64>]) -> Self {
        let points = pairs
            .iter()
            .filter_map(|pair| match pair.as_slice() {
                [ms, price, ..] => DateTime::from_timestamp_millis(*ms as i64)
                    .map(|time| PricePoint { time, price: *price }),
                _ => None,
            })
            .collect();

        Self {
            coin_id,
            window,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Prix minimum et maximum de la série
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
            (min.min(p.price), max.max(p.price))
        }))
    }

    /// Variation entre le premier et le dernier point, en pourcentage
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.first()?.price;
        let last = self.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days() {
        let days: Vec<u32> = LookbackWindow::all().iter().map(|w| w.days()).collect();
        assert_eq!(days, vec![1, 7, 30, 365]);
        assert_eq!(LookbackWindow::default(), LookbackWindow::Day);
        assert_eq!(LookbackWindow::Year.next(), LookbackWindow::Day);
        assert_eq!(LookbackWindow::Day.previous(), LookbackWindow::Year);
    }

    #[test]
    fn test_from_raw_pairs() {
        let pairs = vec![
            vec![1_700_000_000_000.0, 100.0],
            vec![1_700_000_300_000.0],
            vec![1_700_000_600_000.0, 110.0],
        ];
        let series = ChartSeries::from_raw_pairs("bitcoin".to_string(), LookbackWindow::Day, &pairs);

        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().time.timestamp(), 1_700_000_000);
        assert_eq!(series.price_bounds(), Some((100.0, 110.0)));
        let change = series.change_percent().unwrap();
        assert!((change - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series() {
        let series = ChartSeries::new("bitcoin".to_string(), LookbackWindow::Week);
        assert!(series.is_empty());
        assert!(series.price_bounds().is_none());
        assert!(series.change_percent().is_none());
    }
}
