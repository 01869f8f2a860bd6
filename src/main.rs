// ============================================================================
// TickerChart - Graphique de cours interactif dans le terminal
// ============================================================================
// Affiche le cours d'un ticker sur une période, avec lecture d'un point
// à la souris (drag) et changement de période au clavier.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode + capture souris
// 2. Event loop : render → input → update
// 3. Worker thread avec son runtime tokio pour les appels HTTP
// 4. Channels mpsc : commandes vers le worker, résultats vers l'UI
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{debug, error, info, warn};

use tickerchart::api::fetch_chart_series;
use tickerchart::app::{App, ChartRequest};
use tickerchart::chart_data::Gesture;
use tickerchart::config::Config;
use tickerchart::models::{ChartRange, PriceSeries};
use tickerchart::ui::{self, chart::plot_width, events::EventHandler};

// ============================================================================
// AppCommand / AppResult : messages échangés avec le worker
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Charger la série d'un ticker pour une période
    Fetch(ChartRequest),
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Réponse à une requête, identifiée par son id
    ChartLoaded {
        request_id: u64,
        result: Result<PriceSeries, String>,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne sont pas visibles une fois le TUI lancé : on log vers
// un fichier, avec rotation quotidienne.
// ============================================================================

/// Initialise le logging vers fichier
///
/// ```bash
/// tail -f ~/.local/share/tickerchart/logs/tickerchart.log.*
/// RUST_LOG=tickerchart=trace cargo run -- MSFT
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "tickerchart.log");

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
            // Par défaut : debug pour tickerchart, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickerchart=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(log_dir = %log_dir.display(), "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // .env optionnel : son absence n'est pas une erreur
    dotenv::dotenv().ok();

    let config = Config::load().context("Configuration invalide")?;

    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(symbol = %config.symbol, range = %config.range, refresh = ?config.refresh_interval, "TickerChart starting up");

    // Runtime créé ici pour que l'erreur remonte avant d'entrer en mode TUI
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(&config);
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Worker thread
// ============================================================================
// Les appels HTTP bloqueraient l'UI : ils tournent dans un thread dédié
// qui possède son runtime tokio. Les requêtes sont traitées dans l'ordre ;
// l'App ignore les réponses devenues obsolètes.
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        // recv() échoue quand l'UI a fermé le channel
        while let Ok(command) = command_rx.recv() {
            debug!(?command, "Worker received command");

            match command {
                AppCommand::Fetch(request) => {
                    let result = runtime
                        .block_on(fetch_chart_series(&request.symbol, request.range))
                        .map_err(|e| {
                            error!(ticker = %request.symbol, range = %request.range, error = ?e, "Failed to load chart series");
                            format!("{:#}", e)
                        });

                    let message = AppResult::ChartLoaded {
                        request_id: request.id,
                        result,
                    };
                    if result_tx.send(message).is_err() {
                        break;
                    }
                }
            }
        }
        info!("Worker thread exiting (channel closed)");
    });
}

fn send_request(command_tx: &mpsc::Sender<AppCommand>, request: ChartRequest) {
    if let Err(e) = command_tx.send(AppCommand::Fetch(request)) {
        error!(error = %e, "Failed to send request to worker");
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    // Zone du plot au dernier rendu (None si aucun graphique)
    let mut plot: Option<Rect> = None;

    send_request(&command_tx, app.request_chart(Instant::now()));

    while app.is_running() {
        // 0. RÉSULTATS : tous ceux arrivés depuis le dernier tour
        loop {
            match result_rx.try_recv() {
                Ok(AppResult::ChartLoaded { request_id, result }) => {
                    app.apply_fetch_result(request_id, result);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    anyhow::bail!("Le worker thread s'est arrêté");
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| plot = ui::render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, plot, &command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }

        // 3. UPDATE : rafraîchissement périodique
        if let Some(request) = app.tick(Instant::now()) {
            debug!(id = request.id, "Periodic refresh");
            send_request(&command_tx, request);
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

fn handle_event(
    app: &mut App,
    event: ui::Event,
    plot: Option<Rect>,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use tickerchart::ui::events::{
        is_confirm_event, is_escape_event, is_interrupt_event, is_next_range_event,
        is_previous_range_event, is_quit_event, is_refresh_event, mouse_gesture, range_shortcut,
        Event,
    };

    if is_interrupt_event(&event) {
        info!("User interrupted");
        app.quit();
        return;
    }

    // Two-step quit : la deuxième touche décide
    if app.is_awaiting_quit_confirmation() {
        if let Event::Key(_) = event {
            if is_confirm_event(&event) || is_quit_event(&event) {
                info!("User confirmed quit");
                app.quit();
            } else {
                app.cancel_quit();
            }
        }
        return;
    }

    match event {
        Event::Key(_) if is_quit_event(&event) => {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }

        Event::Key(_) if is_escape_event(&event) => {
            app.handle_gesture(Gesture::End, 0.0);
        }

        Event::Key(_) if is_next_range_event(&event) => {
            let request = app.next_range(Instant::now());
            send_request(command_tx, request);
        }

        Event::Key(_) if is_previous_range_event(&event) => {
            let request = app.previous_range(Instant::now());
            send_request(command_tx, request);
        }

        Event::Key(_) if is_refresh_event(&event) => {
            info!("User requested refresh");
            let request = app.request_chart(Instant::now());
            send_request(command_tx, request);
        }

        Event::Key(_) => {
            if let Some(range) = range_shortcut(&event).and_then(|i| ChartRange::all().get(i).copied()) {
                if range != app.selected_range {
                    let request = app.select_range(range, Instant::now());
                    send_request(command_tx, request);
                }
            }
        }

        Event::Mouse(mouse) => {
            // Sans graphique affiché, seul le relâchement compte
            let area = plot.unwrap_or_default();
            if let Some(gesture) = mouse_gesture(&mouse, area) {
                app.handle_gesture(gesture, plot_width(area));
            }
        }

        Event::Resize(width, height) => {
            debug!(width, height, "Terminal resized");
        }

        Event::Tick => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    // Capture souris : nécessaire pour le drag sur le graphique
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
