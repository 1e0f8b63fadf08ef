// ============================================================================
// Sélection : devise, tri, catégorie
// ============================================================================
// Les paramètres de filtrage de la liste de marché
//
// CONCEPTS RUST :
// 1. Enums Copy : petites valeurs, copiées sans allocation
// 2. &'static str : identifiants API stockés dans le binaire
// 3. Cycle d'états : next() / previous() comme pour un sélecteur
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Devise d'affichage
// ============================================================================

/// Devise dans laquelle les prix sont demandés (`vs_currency`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Chf,
}

impl Currency {
    /// Devises disponibles, triées par nom
    pub fn all() -> Vec<Currency> {
        let mut all = vec![Currency::Usd, Currency::Eur, Currency::Chf];
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Code CoinGecko (ex: "usd")
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Chf => "chf",
        }
    }

    /// Symbole affiché devant les prix
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Chf => "Fr",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Chf => "Swiss Franc",
        }
    }

    /// Retrouve une devise depuis son code, insensible à la casse
    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::all()
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Devise suivante dans l'ordre d'affichage (cyclique)
    pub fn next(&self) -> Currency {
        cycle(&Currency::all(), self, 1)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

// ============================================================================
// Ordre de tri
// ============================================================================

/// Ordre de tri côté serveur (`order`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    MarketCapDesc,
    MarketCapAsc,
    PriceDesc,
    PriceAsc,
}

impl SortOrder {
    pub fn all() -> Vec<SortOrder> {
        vec![
            SortOrder::MarketCapDesc,
            SortOrder::MarketCapAsc,
            SortOrder::PriceDesc,
            SortOrder::PriceAsc,
        ]
    }

    /// Identifiant CoinGecko (ex: "market_cap_desc")
    pub fn api_id(&self) -> &'static str {
        match self {
            SortOrder::MarketCapDesc => "market_cap_desc",
            SortOrder::MarketCapAsc => "market_cap_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::PriceAsc => "price_asc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::MarketCapDesc => "Cap. Boursière (Haut)",
            SortOrder::MarketCapAsc => "Cap. Boursière (Bas)",
            SortOrder::PriceDesc => "Prix (Haut)",
            SortOrder::PriceAsc => "Prix (Bas)",
        }
    }

    pub fn next(&self) -> SortOrder {
        cycle(&SortOrder::all(), self, 1)
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::MarketCapDesc
    }
}

// ============================================================================
// Catégorie
// ============================================================================

/// Filtre de catégorie (`category`)
///
/// `All` correspond à l'identifiant vide : le paramètre n'est pas envoyé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    All,
    SmartContracts,
    DeFi,
    ArtificialIntelligence,
    Memes,
    Stablecoins,
}

impl Category {
    pub fn all() -> Vec<Category> {
        vec![
            Category::All,
            Category::SmartContracts,
            Category::DeFi,
            Category::ArtificialIntelligence,
            Category::Memes,
            Category::Stablecoins,
        ]
    }

    /// Identifiant CoinGecko, vide pour `All`
    pub fn api_id(&self) -> &'static str {
        match self {
            Category::All => "",
            Category::SmartContracts => "smart-contract-platform",
            Category::DeFi => "decentralized-finance-defi",
            Category::ArtificialIntelligence => "artificial-intelligence",
            Category::Memes => "meme-token",
            Category::Stablecoins => "stablecoins",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::All => "Toutes",
            Category::SmartContracts => "Smart Contracts",
            Category::DeFi => "DeFi",
            Category::ArtificialIntelligence => "IA",
            Category::Memes => "Memes",
            Category::Stablecoins => "Stablecoins",
        }
    }

    pub fn next(&self) -> Category {
        cycle(&Category::all(), self, 1)
    }

    pub fn previous(&self) -> Category {
        let all = Category::all();
        cycle(&all, self, all.len() - 1)
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::All
    }
}

// ============================================================================
// Thème
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Avance de `step` positions dans une liste cyclique
fn cycle<T: Copy + PartialEq>(all: &[T], current: &T, step: usize) -> T {
    let pos = all.iter().position(|x| x == current).unwrap_or(0);
    all[(pos + step) % all.len()]
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies_sorted_by_name() {
        let names: Vec<&str> = Currency::all().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Euro", "Swiss Franc", "US Dollar"]);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::Usd));
        assert_eq!(Currency::from_code("chf"), Some(Currency::Chf));
        assert_eq!(Currency::from_code("jpy"), None);
    }

    #[test]
    fn test_currency_cycle() {
        // Ordre d'affichage : Euro → Swiss Franc → US Dollar → Euro
        assert_eq!(Currency::Eur.next(), Currency::Chf);
        assert_eq!(Currency::Usd.next(), Currency::Eur);
    }

    #[test]
    fn test_category_ids() {
        assert_eq!(Category::All.api_id(), "");
        assert_eq!(Category::Memes.api_id(), "meme-token");
        assert_eq!(Category::All.previous(), Category::Stablecoins);
        assert_eq!(Category::Stablecoins.next(), Category::All);
    }

    #[test]
    fn test_sort_cycle() {
        assert_eq!(SortOrder::default().api_id(), "market_cap_desc");
        assert_eq!(SortOrder::PriceAsc.next(), SortOrder::MarketCapDesc);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default().toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
