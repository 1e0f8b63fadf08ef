// ============================================================================
// CryptoPulse - Dashboard crypto en terminal
// ============================================================================
// Table des actifs CoinGecko, graphique et rapports Gemini, radio
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread : les appels réseau ne bloquent jamais l'UI
// 4. Ownership : le thread UI possède App seul, sans Mutex
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cryptopulse::api::{MarketClient, ReportClient, ReqwestTransport, RetryPolicy, TokioSleeper};
use cryptopulse::app::{App, Screen};
use cryptopulse::config::Config;
use cryptopulse::radio::{MpvSink, RadioPlayer, STATIONS};
use cryptopulse::ui::{events::EventHandler, render, Event};
use cryptopulse::worker::{AppCommand, AppResult, Worker};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, rotation quotidienne
// ============================================================================

/// Répertoire des logs : ~/.local/share/cryptopulse/logs, sinon ./logs
fn log_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("cryptopulse").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/cryptopulse/logs/cryptopulse.log.*
/// RUST_LOG=cryptopulse=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cryptopulse.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour cryptopulse, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptopulse=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    let config = Config::from_env();
    info!(
        coingecko = %config.coingecko_url,
        gemini_key = config.gemini_api_key.is_some(),
        max_retries = config.max_retries,
        "CryptoPulse starting up"
    );

    // Clients partagés par toutes les tâches du worker
    let transport = Arc::new(ReqwestTransport::new().context("Impossible de créer le client HTTP")?);
    let market = MarketClient::new(
        config.coingecko_url.clone(),
        transport.clone(),
        Arc::new(TokioSleeper),
        RetryPolicy::with_max_attempts(config.max_retries),
    );
    let reports = ReportClient::new(config.gemini_url.clone(), config.gemini_api_key.clone(), transport);
    if !reports.has_api_key() {
        warn!("No Gemini API key configured, reports will use placeholders");
    }

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let worker = Worker::new(market, reports).spawn(command_rx, result_tx);

    let mut app = App::with_config(&config);
    let mut radio = RadioPlayer::new(MpvSink::new());
    for command in app.initial_commands() {
        send(&command_tx, command);
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &mut radio, &events, &command_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    radio.stop();

    // Fermer le channel arrête le worker
    drop(command_tx);
    if worker.join().is_err() {
        error!("Worker thread panicked");
    }

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Envoie une commande au worker
fn send(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if command_tx.send(command).is_err() {
        error!("Worker channel closed, command dropped");
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Intégrer les résultats du worker
//   1. Dessiner l'interface
//   2. Traiter les événements clavier
//   3. Rafraîchissement automatique
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    radio: &mut RadioPlayer<MpvSink>,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // 0. RÉSULTATS : tout ce qui est arrivé depuis le dernier tour
        loop {
            match result_rx.try_recv() {
                Ok(result) => {
                    app.apply(result);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // 1. RENDER
        let now_playing = radio.current_station();
        terminal.draw(|frame| render(frame, app, now_playing))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => {
                for command in handle_event(app, radio, event) {
                    send(command_tx, command);
                }
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        // 3. UPDATE
        if let Some(command) = app.tick() {
            send(command_tx, command);
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT : Event Handler Pattern
// - Les méthodes de App retournent les commandes à envoyer
// - handle_event ne fait que router les touches selon l'écran
// ============================================================================

/// Traite un événement et retourne les commandes à envoyer au worker
fn handle_event(app: &mut App, radio: &mut RadioPlayer<MpvSink>, event: Event) -> Vec<AppCommand> {
    use cryptopulse::ui::events::*;

    if let Event::Tick = event {
        return Vec::new();
    }

    // La saisie de recherche capture toutes les touches
    if app.screen() == Screen::SearchInput {
        if is_escape_event(&event) {
            app.cancel_search_input();
        } else if is_enter_event(&event) {
            return app.submit_search_input().into_iter().collect();
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if let Some(c) = get_char_from_event(&event).filter(|_| is_text_char_event(&event)) {
            app.append_char(c);
        }
        return Vec::new();
    }

    // Two-step quit, depuis n'importe quel écran
    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return Vec::new();
    }
    app.cancel_quit();

    match app.screen() {
        Screen::Dashboard => handle_dashboard(app, &event),
        Screen::Detail => handle_detail(app, &event),
        Screen::Radio => {
            handle_radio(app, radio, &event);
            Vec::new()
        }
        Screen::SearchInput => Vec::new(),
    }
}

fn handle_dashboard(app: &mut App, event: &Event) -> Vec<AppCommand> {
    use cryptopulse::ui::events::*;

    if is_up_event(event) {
        app.navigate_up();
    } else if is_down_event(event) {
        app.navigate_down();
    } else if is_left_event(event) {
        return app.previous_page().into_iter().collect();
    } else if is_right_event(event) {
        return app.next_page().into_iter().collect();
    } else if is_enter_event(event) {
        return app.open_selected_detail();
    } else if is_search_event(event) {
        app.start_search_input();
    } else if is_clear_search_event(event) || is_escape_event(event) {
        app.clear_search();
    } else if is_favorite_event(event) {
        app.toggle_selected_favorite();
    } else if is_currency_event(event) {
        return app.set_currency(app.currency().next());
    } else if is_sort_event(event) {
        return vec![app.set_sort(app.sort().next())];
    } else if is_category_event(event) {
        return vec![app.set_category(app.category().next())];
    } else if is_refresh_event(event) {
        return vec![app.refresh()];
    } else if is_theme_event(event) {
        app.toggle_theme();
    } else if is_radio_event(event) {
        app.show_radio();
    }
    Vec::new()
}

fn handle_detail(app: &mut App, event: &Event) -> Vec<AppCommand> {
    use cryptopulse::ui::events::*;

    let command = if is_escape_event(event) || is_space_event(event) {
        app.close_detail();
        None
    } else if is_left_event(event) {
        app.previous_window()
    } else if is_right_event(event) {
        app.next_window()
    } else if is_refresh_event(event) {
        app.toggle_report()
    } else if is_analysis_event(event) {
        app.request_analysis()
    } else {
        None
    };
    command.into_iter().collect()
}

fn handle_radio(app: &mut App, radio: &mut RadioPlayer<MpvSink>, event: &Event) {
    use cryptopulse::ui::events::*;

    if is_escape_event(event) || is_radio_event(event) {
        app.show_dashboard();
    } else if is_up_event(event) {
        app.radio_up();
    } else if is_down_event(event) {
        app.radio_down(STATIONS.len());
    } else if is_enter_event(event) {
        if let Err(e) = radio.play(app.radio_cursor()) {
            error!(error = ?e, "Failed to start radio");
        }
    } else if is_stop_event(event) {
        radio.stop();
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Impossible d'activer le raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Impossible d'initialiser le terminal")
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
