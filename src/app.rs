// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global du dashboard
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Encapsulation : les champs sont privés, accès via méthodes publiques
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - App ne fait jamais d'I/O : les opérations retournent les AppCommand à
//   envoyer au worker, et apply() intègre les AppResult
//
// JETONS DE REQUÊTE :
// - Chaque commande reçoit un jeton croissant
// - Chaque "slot" d'état (liste, recherche, graphique, détail...) retient
//   le dernier jeton émis
// - Un résultat dont le jeton n'est plus le dernier est ignoré : une réponse
//   tardive ne peut pas écraser un état plus récent
// ============================================================================

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::api::MarketQuery;
use crate::config::{Config, DEFAULT_TOTAL_ASSETS, MAX_COINS_PER_PAGE};
use crate::models::{Category, ChartSeries, Coin, Currency, LookbackWindow, SortOrder, Theme};
use crate::worker::{AppCommand, AppResult, RequestToken};

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : table des actifs
    Dashboard,

    /// Saisie de la recherche libre
    /// - Capture les touches pour construire la requête
    /// - Enter valide, ESC annule
    SearchInput,

    /// Overlay de détail : graphique ou rapport de l'actif sélectionné
    Detail,

    /// Liste des radios
    Radio,
}

// ============================================================================
// Jetons par slot
// ============================================================================

/// Dernier jeton émis pour chaque slot d'état
#[derive(Debug, Default)]
struct RequestTokens {
    last_issued: RequestToken,
    listing: RequestToken,
    global: RequestToken,
    search: RequestToken,
    chart: RequestToken,
    detail: RequestToken,
}

impl RequestTokens {
    /// Jeton suivant (jamais 0, 0 signifie "rien émis")
    fn next(&mut self) -> RequestToken {
        self.last_issued += 1;
        self.last_issued
    }
}

// ============================================================================
// Sous-état de l'overlay de détail
// ============================================================================

/// État de l'overlay ouvert sur un actif
///
/// Détruit entièrement à la fermeture : aucun graphique ni rapport n'est
/// conservé d'une sélection à l'autre.
#[derive(Debug, Clone)]
pub struct DetailState {
    pub coin: Coin,
    /// Devise des prix de `coin` et du graphique
    pub currency: Currency,
    pub window: LookbackWindow,
    pub chart: ChartSeries,
    chart_pending: bool,
    links_pending: bool,
    /// Premier lien officiel trouvé
    pub official_link: Option<String>,
    /// Vue rapport (true) ou graphique (false)
    pub report_mode: bool,
    pub report: Option<String>,
    pub report_loading: bool,
    pub analysis: Option<String>,
    pub analysis_loading: bool,
}

impl DetailState {
    fn new(coin: Coin, currency: Currency) -> Self {
        let chart = ChartSeries::new(coin.id.clone(), LookbackWindow::Day);
        Self {
            coin,
            currency,
            window: LookbackWindow::Day,
            chart,
            chart_pending: true,
            links_pending: true,
            official_link: None,
            report_mode: false,
            report: None,
            report_loading: false,
            analysis: None,
            analysis_loading: false,
        }
    }

    /// Vrai tant que le graphique ou la recherche de liens est en vol
    pub fn is_chart_loading(&self) -> bool {
        self.chart_pending || self.links_pending
    }
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    running: bool,

    /// Two-step quit : première pression de 'q' demande confirmation
    confirm_quit: bool,

    screen: Screen,

    // --- Sélection ---
    currency: Currency,
    sort: SortOrder,
    category: Category,
    page: u32,

    /// Texte de recherche (conservé après validation)
    search_query: String,

    // --- Données ---
    /// Dernière page de la liste reçue
    coins: Vec<Coin>,

    /// Résultats de recherche
    /// - None : pas de recherche active, la liste est affichée
    /// - Some(vec) : masque la liste, même vide
    search_results: Option<Vec<Coin>>,

    /// Dernière requête de recherche envoyée (texte nettoyé)
    last_search: String,

    // Devise dans laquelle chaque lot a été demandé puis reçu : les prix
    // affichés gardent leur devise tant que le nouveau lot n'est pas arrivé
    listing_currency: Currency,
    pending_listing_currency: Currency,
    search_currency: Currency,
    pending_search_currency: Currency,

    total_assets: u64,

    favorites: HashSet<String>,

    theme: Theme,

    /// Index du curseur dans la liste affichée
    selected_index: usize,

    listing_pending: bool,
    search_pending: bool,

    detail: Option<DetailState>,

    /// Curseur dans la liste des radios
    radio_cursor: usize,

    tokens: RequestTokens,

    // --- Rafraîchissement automatique ---
    refresh_interval: Duration,
    last_listing_request: Instant,
}

impl App {
    /// Crée une nouvelle instance avec la configuration par défaut
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            screen: Screen::Dashboard,
            currency: config.default_currency,
            sort: SortOrder::default(),
            category: Category::default(),
            page: 1,
            search_query: String::new(),
            coins: Vec::new(),
            search_results: None,
            last_search: String::new(),
            listing_currency: config.default_currency,
            pending_listing_currency: config.default_currency,
            search_currency: config.default_currency,
            pending_search_currency: config.default_currency,
            total_assets: DEFAULT_TOTAL_ASSETS,
            favorites: HashSet::new(),
            theme: Theme::default(),
            selected_index: 0,
            listing_pending: false,
            search_pending: false,
            detail: None,
            radio_cursor: 0,
            tokens: RequestTokens::default(),
            refresh_interval: config.refresh_interval,
            last_listing_request: Instant::now(),
        }
    }

    /// Commandes du démarrage : stats globales + première page
    pub fn initial_commands(&mut self) -> Vec<AppCommand> {
        let token = self.tokens.next();
        self.tokens.global = token;
        vec![AppCommand::FetchGlobalStats { token }, self.fetch_listing()]
    }

    // ========================================================================
    // Lecture de l'état
    // ========================================================================

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Devise sélectionnée (celle des prochaines requêtes)
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Devise des prix actuellement affichés dans la table
    pub fn display_currency(&self) -> Currency {
        if self.search_results.is_some() {
            self.search_currency
        } else {
            self.listing_currency
        }
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn total_assets(&self) -> u64 {
        self.total_assets
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn is_search_active(&self) -> bool {
        self.search_results.is_some()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn detail(&self) -> Option<&DetailState> {
        self.detail.as_ref()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Liste ou recherche en cours de chargement
    pub fn is_loading(&self) -> bool {
        self.listing_pending || self.search_pending
    }

    /// Nombre de pages : ceil(total / 250), au moins 1
    pub fn max_pages(&self) -> u32 {
        let per_page = MAX_COINS_PER_PAGE as u64;
        (self.total_assets.div_ceil(per_page)).max(1) as u32
    }

    pub fn can_go_previous(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.page < self.max_pages()
    }

    /// Liste affichée : recherche si active, sinon la page courante,
    /// favoris en tête (tri stable)
    pub fn display_coins(&self) -> Vec<&Coin> {
        let source = self.search_results.as_ref().unwrap_or(&self.coins);
        let (mut favorites, others): (Vec<&Coin>, Vec<&Coin>) =
            source.iter().partition(|c| self.favorites.contains(&c.id));
        favorites.extend(others);
        favorites
    }

    /// Actif sous le curseur
    pub fn selected_coin(&self) -> Option<&Coin> {
        self.display_coins().get(self.selected_index).copied()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Navigue vers le haut dans la table
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Navigue vers le bas, sans dépasser la dernière ligne
    pub fn navigate_down(&mut self) {
        let max_index = self.display_coins().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    fn clamp_selection(&mut self) {
        let max_index = self.display_coins().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    pub fn show_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
    }

    pub fn show_radio(&mut self) {
        self.screen = Screen::Radio;
    }

    pub fn radio_cursor(&self) -> usize {
        self.radio_cursor
    }

    pub fn radio_up(&mut self) {
        self.radio_cursor = self.radio_cursor.saturating_sub(1);
    }

    /// Descend dans une liste de `count` stations
    pub fn radio_down(&mut self, count: usize) {
        self.radio_cursor = (self.radio_cursor + 1).min(count.saturating_sub(1));
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!(theme = ?self.theme, "Theme toggled");
    }

    // ========================================================================
    // Filtres : tout changement relance la liste
    // ========================================================================

    /// Émet une commande de liste avec un nouveau jeton
    fn fetch_listing(&mut self) -> AppCommand {
        let token = self.tokens.next();
        self.tokens.listing = token;
        self.listing_pending = true;
        self.pending_listing_currency = self.currency;
        self.last_listing_request = Instant::now();
        AppCommand::FetchMarkets {
            token,
            query: MarketQuery::new(self.currency, self.sort, self.category, self.page),
        }
    }

    /// Change la devise : relance la liste, et la recherche si elle est active
    pub fn set_currency(&mut self, currency: Currency) -> Vec<AppCommand> {
        self.currency = currency;
        info!(currency = currency.code(), "Currency changed");
        let mut commands = vec![self.fetch_listing()];
        if self.is_search_active() || self.search_pending {
            let query = self.last_search.clone();
            commands.push(self.issue_search(query));
        }
        commands
    }

    pub fn set_sort(&mut self, sort: SortOrder) -> AppCommand {
        self.sort = sort;
        info!(order = sort.api_id(), "Sort order changed");
        self.fetch_listing()
    }

    /// Change la catégorie et revient à la page 1
    pub fn set_category(&mut self, category: Category) -> AppCommand {
        self.category = category;
        self.page = 1;
        info!(category = category.api_id(), "Category changed");
        self.fetch_listing()
    }

    /// Page suivante, None si déjà sur la dernière
    pub fn next_page(&mut self) -> Option<AppCommand> {
        if !self.can_go_next() {
            return None;
        }
        self.page += 1;
        self.selected_index = 0;
        Some(self.fetch_listing())
    }

    /// Page précédente, None si déjà sur la première
    pub fn previous_page(&mut self) -> Option<AppCommand> {
        if !self.can_go_previous() {
            return None;
        }
        self.page -= 1;
        self.selected_index = 0;
        Some(self.fetch_listing())
    }

    /// Recharge la page courante
    pub fn refresh(&mut self) -> AppCommand {
        self.fetch_listing()
    }

    /// Rafraîchissement automatique, appelé à chaque tour de boucle
    pub fn tick(&mut self) -> Option<AppCommand> {
        self.tick_at(Instant::now())
    }

    /// Idem avec une horloge explicite
    pub fn tick_at(&mut self, now: Instant) -> Option<AppCommand> {
        if self.listing_pending {
            return None;
        }
        if now.saturating_duration_since(self.last_listing_request) < self.refresh_interval {
            return None;
        }
        debug!("Auto-refresh of the listing");
        Some(self.fetch_listing())
    }

    // ========================================================================
    // Favoris
    // ========================================================================

    pub fn toggle_favorite(&mut self, id: &str) {
        if !self.favorites.remove(id) {
            self.favorites.insert(id.to_string());
        }
    }

    /// Bascule le favori de l'actif sous le curseur
    pub fn toggle_selected_favorite(&mut self) {
        if let Some(id) = self.selected_coin().map(|c| c.id.clone()) {
            self.toggle_favorite(&id);
        }
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    /// Entre en saisie de recherche (le texte précédent est conservé)
    pub fn start_search_input(&mut self) {
        self.screen = Screen::SearchInput;
    }

    pub fn cancel_search_input(&mut self) {
        self.screen = Screen::Dashboard;
    }

    pub fn append_char(&mut self, c: char) {
        self.search_query.push(c);
    }

    pub fn backspace(&mut self) {
        self.search_query.pop();
    }

    /// Valide la saisie courante
    pub fn submit_search_input(&mut self) -> Option<AppCommand> {
        self.screen = Screen::Dashboard;
        let query = self.search_query.clone();
        self.submit_search(&query)
    }

    /// Lance une recherche
    ///
    /// Une requête vide efface les résultats sans appel réseau.
    pub fn submit_search(&mut self, query: &str) -> Option<AppCommand> {
        self.search_query = query.to_string();
        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.clear_search_results();
            return None;
        }

        info!(query = %trimmed, "Search submitted");
        Some(self.issue_search(trimmed.to_string()))
    }

    fn issue_search(&mut self, query: String) -> AppCommand {
        let token = self.tokens.next();
        self.tokens.search = token;
        self.search_pending = true;
        self.pending_search_currency = self.currency;
        self.last_search = query.clone();
        AppCommand::Search {
            token,
            query,
            currency: self.currency,
        }
    }

    /// Efface la recherche et réaffiche la liste
    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.clear_search_results();
    }

    fn clear_search_results(&mut self) {
        self.search_results = None;
        self.search_pending = false;
        // Invalide une recherche encore en vol
        self.tokens.search = self.tokens.next();
        self.selected_index = 0;
    }

    // ========================================================================
    // Overlay de détail
    // ========================================================================

    /// Ouvre le détail d'un actif
    ///
    /// Lance en parallèle le graphique 24h et la recherche du site officiel.
    /// Le graphique suit la devise des prix de l'actif affiché.
    pub fn open_detail(&mut self, coin: Coin) -> Vec<AppCommand> {
        let currency = self.display_currency();
        let detail_token = self.tokens.next();
        self.tokens.detail = detail_token;
        let chart_token = self.tokens.next();
        self.tokens.chart = chart_token;

        info!(coin = %coin.id, "Opening detail view");
        let commands = vec![
            AppCommand::FetchChart {
                token: chart_token,
                coin_id: coin.id.clone(),
                currency,
                window: LookbackWindow::Day,
            },
            AppCommand::FetchOfficialLinks {
                token: detail_token,
                coin: coin.clone(),
            },
        ];
        self.detail = Some(DetailState::new(coin, currency));
        self.screen = Screen::Detail;
        commands
    }

    /// Ouvre le détail de l'actif sous le curseur
    pub fn open_selected_detail(&mut self) -> Vec<AppCommand> {
        match self.selected_coin().cloned() {
            Some(coin) => self.open_detail(coin),
            None => Vec::new(),
        }
    }

    /// Ferme l'overlay et oublie tout son état
    pub fn close_detail(&mut self) {
        if let Some(detail) = self.detail.take() {
            debug!(coin = %detail.coin.id, "Closing detail view");
        }
        self.tokens.detail = self.tokens.next();
        self.tokens.chart = self.tokens.next();
        self.screen = Screen::Dashboard;
    }

    /// Change la fenêtre du graphique et recharge uniquement le graphique
    pub fn set_window(&mut self, window: LookbackWindow) -> Option<AppCommand> {
        let token = self.tokens.next();
        let detail = self.detail.as_mut()?;
        if detail.window == window {
            return None;
        }

        self.tokens.chart = token;
        detail.window = window;
        detail.chart_pending = true;
        detail.report_mode = false;
        Some(AppCommand::FetchChart {
            token,
            coin_id: detail.coin.id.clone(),
            currency: detail.currency,
            window,
        })
    }

    pub fn next_window(&mut self) -> Option<AppCommand> {
        let window = self.detail.as_ref()?.window.next();
        self.set_window(window)
    }

    pub fn previous_window(&mut self) -> Option<AppCommand> {
        let window = self.detail.as_ref()?.window.previous();
        self.set_window(window)
    }

    /// Bascule la vue rapport
    ///
    /// Le rapport n'est généré qu'une fois par sélection : à la première
    /// ouverture, puis servi depuis le cache.
    pub fn toggle_report(&mut self) -> Option<AppCommand> {
        let token = self.tokens.detail;
        let detail = self.detail.as_mut()?;
        detail.report_mode = !detail.report_mode;

        if detail.report_mode && detail.report.is_none() && !detail.report_loading {
            detail.report_loading = true;
            info!(coin = %detail.coin.id, "Requesting deep report");
            return Some(AppCommand::GenerateReport {
                token,
                coin: detail.coin.clone(),
            });
        }
        None
    }

    /// Demande l'analyse courte (une fois par sélection)
    pub fn request_analysis(&mut self) -> Option<AppCommand> {
        let token = self.tokens.detail;
        let detail = self.detail.as_mut()?;
        if detail.analysis.is_some() || detail.analysis_loading {
            return None;
        }
        detail.analysis_loading = true;
        Some(AppCommand::GenerateAnalysis {
            token,
            coin: detail.coin.clone(),
        })
    }

    // ========================================================================
    // Intégration des résultats
    // ========================================================================

    /// Intègre un résultat du worker
    ///
    /// Retourne false si le résultat était périmé et a été ignoré.
    pub fn apply(&mut self, result: AppResult) -> bool {
        match result {
            AppResult::MarketsLoaded { token, result } => {
                if token != self.tokens.listing {
                    return self.discard("markets", token);
                }
                self.listing_pending = false;
                match result {
                    Ok(Some(coins)) => {
                        info!(count = coins.len(), page = self.page, "Listing updated");
                        self.coins = coins;
                        self.listing_currency = self.pending_listing_currency;
                        self.clamp_selection();
                    }
                    Ok(None) => warn!("Listing response had no data, keeping previous page"),
                    Err(e) => error!(error = %e, "Listing fetch failed, keeping previous page"),
                }
            }

            AppResult::GlobalStatsLoaded { token, result } => {
                if token != self.tokens.global {
                    return self.discard("global", token);
                }
                match result {
                    Ok(Some(total)) => {
                        info!(total, "Total asset count updated");
                        self.total_assets = total;
                    }
                    Ok(None) => warn!("Global stats without asset count"),
                    Err(e) => error!(error = %e, "Global stats fetch failed"),
                }
            }

            AppResult::SearchLoaded { token, result } => {
                if token != self.tokens.search {
                    return self.discard("search", token);
                }
                self.search_pending = false;
                let coins = result.unwrap_or_else(|e| {
                    error!(error = %e, "Search failed");
                    Vec::new()
                });
                info!(count = coins.len(), "Search results received");
                self.search_results = Some(coins);
                self.search_currency = self.pending_search_currency;
                self.selected_index = 0;
            }

            AppResult::ChartLoaded { token, result } => {
                if token != self.tokens.chart {
                    return self.discard("chart", token);
                }
                let Some(detail) = self.detail.as_mut() else {
                    return self.discard("chart", token);
                };
                detail.chart_pending = false;
                detail.chart = result.unwrap_or_else(|e| {
                    error!(coin = %detail.coin.id, error = %e, "Chart fetch failed");
                    ChartSeries::new(detail.coin.id.clone(), detail.window)
                });
            }

            AppResult::LinksLoaded { token, links } => {
                let Some(detail) = self.detail_for(token) else {
                    return self.discard("links", token);
                };
                detail.links_pending = false;
                detail.official_link = links.into_iter().next().map(|l| l.uri);
            }

            AppResult::ReportGenerated { token, report } => {
                let Some(detail) = self.detail_for(token) else {
                    return self.discard("report", token);
                };
                detail.report_loading = false;
                detail.report = Some(report);
            }

            AppResult::AnalysisGenerated { token, analysis } => {
                let Some(detail) = self.detail_for(token) else {
                    return self.discard("analysis", token);
                };
                detail.analysis_loading = false;
                detail.analysis = Some(analysis);
            }
        }
        true
    }

    /// Détail courant si le jeton correspond à la sélection ouverte
    fn detail_for(&mut self, token: RequestToken) -> Option<&mut DetailState> {
        if token != self.tokens.detail {
            return None;
        }
        self.detail.as_mut()
    }

    fn discard(&self, slot: &'static str, token: RequestToken) -> bool {
        warn!(slot, token, "Discarding stale result");
        false
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
