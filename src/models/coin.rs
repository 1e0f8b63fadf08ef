// ============================================================================
// Structure : Coin
// ============================================================================
// Représente un actif tel que renvoyé par /coins/markets
//
// CONCEPTS RUST :
// 1. #[derive(Deserialize)] : mapping direct depuis le JSON CoinGecko
// 2. Option<f64> : CoinGecko renvoie `null` pour les actifs peu liquides
// 3. #[serde(default)] : tolère les champs absents
// ============================================================================

use serde::{Deserialize, Serialize};

/// Un actif (crypto-monnaie) de la liste de marché
///
/// Snapshot immuable : remplacé en bloc à chaque rafraîchissement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Identifiant CoinGecko (ex: "bitcoin")
    pub id: String,

    /// Nom affiché (ex: "Bitcoin")
    pub name: String,

    /// Symbole (ex: "btc")
    pub symbol: String,

    /// URL du logo
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub current_price: Option<f64>,

    /// Variation sur 24h en pourcentage
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    /// Plus haut historique (ATH)
    #[serde(default)]
    pub ath: Option<f64>,

    /// Plus bas historique (ATL)
    #[serde(default)]
    pub atl: Option<f64>,
}

impl Coin {
    /// Crée un actif sans données de marché
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            image: None,
            current_price: None,
            price_change_percentage_24h: None,
            market_cap_rank: None,
            market_cap: None,
            ath: None,
            atl: None,
        }
    }

    /// Symbole en majuscules pour l'affichage
    pub fn ticker(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// Retourne true si l'actif est en hausse sur 24h
    pub fn is_positive(&self) -> bool {
        self.price_change_percentage_24h
            .map(|c| c >= 0.0)
            .unwrap_or(false)
    }

    /// Rang formaté : "#1" ou "#??" si inconnu
    pub fn rank_label(&self) -> String {
        match self.market_cap_rank {
            Some(rank) => format!("#{}", rank),
            None => "#??".to_string(),
        }
    }

    /// Variation 24h formatée : "+2.34%" / "-1.20%"
    pub fn change_label(&self) -> String {
        match self.price_change_percentage_24h {
            Some(change) => format!("{:+.2}%", change),
            None => "N/A".to_string(),
        }
    }
}

/// Formate un prix avec un nombre de décimales adapté à sa magnitude
///
/// Les memecoins valent souvent moins d'un centime : on garde jusqu'à
/// 10 décimales significatives, minimum 2.
pub fn format_price(price: f64) -> String {
    let abs = price.abs();
    let decimals = if abs >= 1.0 || abs == 0.0 {
        2
    } else {
        // Nombre de zéros après la virgule + 4 chiffres significatifs
        let zeros = (-abs.log10()).floor() as usize;
        (zeros + 4).min(10)
    };
    let raw = format!("{:.*}", decimals, price);
    if decimals > 2 {
        // Retire les zéros inutiles, en gardant au moins 2 décimales
        let trimmed = raw.trim_end_matches('0');
        let dot = trimmed.find('.').unwrap_or(trimmed.len());
        if trimmed.len() - dot - 1 < 2 {
            format!("{:.2}", price)
        } else {
            trimmed.to_string()
        }
    } else {
        group_thousands(&raw)
    }
}

/// Formate un grand nombre avec séparateur de milliers (ex: 1,234,567)
pub fn format_large(value: f64) -> String {
    group_thousands(&format!("{:.0}", value))
}

/// Insère des virgules dans la partie entière
fn group_thousands(raw: &str) -> String {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (int_part, frac_part) = match digits.find('.') {
        Some(pos) => (&digits[..pos], &digits[pos..]),
        None => (digits, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}{}", sign, grouped, frac_part)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"{
            "id": "bitcoin",
            "name": "Bitcoin",
            "symbol": "btc",
            "image": "https://example.com/btc.png",
            "current_price": 67000.5,
            "price_change_percentage_24h": null,
            "market_cap_rank": 1,
            "market_cap": 1320000000000,
            "ath": 73738,
            "atl": 67.81,
            "sparkline_in_7d": { "price": [1.0, 2.0] }
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.current_price, Some(67000.5));
        assert_eq!(coin.price_change_percentage_24h, None);
        assert_eq!(coin.market_cap_rank, Some(1));
        assert_eq!(coin.ticker(), "BTC");
    }

    #[test]
    fn test_labels() {
        let mut coin = Coin::new("pepe", "Pepe", "pepe");
        assert_eq!(coin.rank_label(), "#??");
        assert_eq!(coin.change_label(), "N/A");
        assert!(!coin.is_positive());

        coin.price_change_percentage_24h = Some(2.346);
        coin.market_cap_rank = Some(24);
        assert_eq!(coin.change_label(), "+2.35%");
        assert_eq!(coin.rank_label(), "#24");
        assert!(coin.is_positive());
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(67000.5), "67,000.50");
        assert_eq!(format_price(1.0), "1.00");
        assert_eq!(format_price(0.5), "0.50");
        assert_eq!(format_price(0.00001234), "0.00001234");
        assert_eq!(format_price(0.0), "0.00");
    }

    #[test]
    fn test_format_large() {
        assert_eq!(format_large(1_320_000_000_000.0), "1,320,000,000,000");
        assert_eq!(format_large(999.0), "999");
        assert_eq!(format_large(-1234.0), "-1,234");
    }
}
