// ============================================================================
// Background Worker
// ============================================================================
// Exécute les appels réseau hors du thread UI
//
// - L'UI envoie des AppCommand sur un channel
// - Le worker lance une tâche tokio par commande : les requêtes se
//   chevauchent, comme des promesses en vol
// - Chaque résultat revient en AppResult avec le jeton de la commande,
//   c'est App qui décide s'il est encore d'actualité
//
// CONCEPTS RUST :
// 1. Thread OS + runtime tokio dédié
// 2. mpsc channels : communication inter-thread
// 3. Clone de clients (Arc internes) dans chaque tâche
// ============================================================================

use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, error, info};

use crate::api::{MarketClient, MarketQuery, ReportClient};
use crate::error::FetchError;
use crate::models::{ChartSeries, Coin, Currency, LookbackWindow, OfficialLink};

/// Jeton de requête : croissant, unique par commande émise
pub type RequestToken = u64;

/// Commandes envoyées au worker
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Page de la liste de marché
    FetchMarkets { token: RequestToken, query: MarketQuery },

    /// Nombre total d'actifs (/global), une fois au démarrage
    FetchGlobalStats { token: RequestToken },

    /// Recherche libre
    Search {
        token: RequestToken,
        query: String,
        currency: Currency,
    },

    /// Série de prix de l'actif ouvert
    FetchChart {
        token: RequestToken,
        coin_id: String,
        currency: Currency,
        window: LookbackWindow,
    },

    /// Recherche du site officiel (Gemini grounded)
    FetchOfficialLinks { token: RequestToken, coin: Coin },

    /// Rapport complet (Gemini)
    GenerateReport { token: RequestToken, coin: Coin },

    /// Analyse courte (Gemini)
    GenerateAnalysis { token: RequestToken, coin: Coin },
}

impl AppCommand {
    pub fn token(&self) -> RequestToken {
        match self {
            AppCommand::FetchMarkets { token, .. }
            | AppCommand::FetchGlobalStats { token }
            | AppCommand::Search { token, .. }
            | AppCommand::FetchChart { token, .. }
            | AppCommand::FetchOfficialLinks { token, .. }
            | AppCommand::GenerateReport { token, .. }
            | AppCommand::GenerateAnalysis { token, .. } => *token,
        }
    }
}

/// Résultats renvoyés par le worker
#[derive(Debug, Clone, PartialEq)]
pub enum AppResult {
    MarketsLoaded {
        token: RequestToken,
        result: Result<Option<Vec<Coin>>, FetchError>,
    },
    GlobalStatsLoaded {
        token: RequestToken,
        result: Result<Option<u64>, FetchError>,
    },
    SearchLoaded {
        token: RequestToken,
        result: Result<Vec<Coin>, FetchError>,
    },
    ChartLoaded {
        token: RequestToken,
        result: Result<ChartSeries, FetchError>,
    },
    LinksLoaded {
        token: RequestToken,
        links: Vec<OfficialLink>,
    },
    ReportGenerated {
        token: RequestToken,
        report: String,
    },
    AnalysisGenerated {
        token: RequestToken,
        analysis: String,
    },
}

/// Exécuteur des commandes
#[derive(Clone)]
pub struct Worker {
    market: MarketClient,
    reports: ReportClient,
}

impl Worker {
    pub fn new(market: MarketClient, reports: ReportClient) -> Self {
        Self { market, reports }
    }

    /// Exécute une commande et produit son résultat
    ///
    /// Ne panique jamais et ne perd jamais le jeton : chaque commande
    /// produit exactement un résultat.
    pub async fn execute(&self, command: AppCommand) -> AppResult {
        match command {
            AppCommand::FetchMarkets { token, query } => AppResult::MarketsLoaded {
                token,
                result: self.market.fetch_markets(&query).await,
            },
            AppCommand::FetchGlobalStats { token } => AppResult::GlobalStatsLoaded {
                token,
                result: self.market.fetch_total_assets().await,
            },
            AppCommand::Search {
                token,
                query,
                currency,
            } => AppResult::SearchLoaded {
                token,
                result: self.market.search(&query, currency).await,
            },
            AppCommand::FetchChart {
                token,
                coin_id,
                currency,
                window,
            } => AppResult::ChartLoaded {
                token,
                result: self.market.fetch_chart(&coin_id, currency, window).await,
            },
            AppCommand::FetchOfficialLinks { token, coin } => AppResult::LinksLoaded {
                token,
                links: self.reports.official_links(&coin).await,
            },
            AppCommand::GenerateReport { token, coin } => AppResult::ReportGenerated {
                token,
                report: self.reports.deep_report(&coin).await,
            },
            AppCommand::GenerateAnalysis { token, coin } => AppResult::AnalysisGenerated {
                token,
                analysis: self.reports.analysis(&coin).await,
            },
        }
    }

    /// Lance le worker dans un thread dédié
    ///
    /// Le thread s'arrête quand le Sender de commandes est fermé.
    ///
    /// # Arguments
    /// * `command_rx` - Receiver pour recevoir les commandes
    /// * `result_tx` - Sender pour envoyer les résultats
    pub fn spawn(
        self,
        command_rx: mpsc::Receiver<AppCommand>,
        result_tx: mpsc::Sender<AppResult>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = ?e, "Failed to create tokio runtime, worker disabled");
                    return;
                }
            };

            while let Ok(command) = command_rx.recv() {
                debug!(?command, "Worker received command");
                let worker = self.clone();
                let tx = result_tx.clone();
                runtime.spawn(async move {
                    let result = worker.execute(command).await;
                    if tx.send(result).is_err() {
                        debug!("Result channel closed, dropping result");
                    }
                });
            }

            info!("Worker thread exiting (channel closed)");
        })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
