mod audio;
mod config;
mod controller;
mod error;
mod logging;
mod model;
mod view;

use std::io;
use std::sync::Arc;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use view::AppView;
use audio::{CpalSink, HttpAssetFetcher, PlayerContext};
use controller::AppController;
use model::{AppModel, FirestoreStore, StyleFilter, UiState};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== BeatsMarket Storefront Starting ===");

    let config = config::load_config()?;
    tracing::info!(
        project = %config.store.project_id,
        collection = %config.store.collection,
        site = %config.site.base_url,
        "Configuration loaded"
    );

    let store = FirestoreStore::new(&config.store).context("Failed to build listing store client")?;
    let fetcher = HttpAssetFetcher::new(&config.site.base_url, config.player.fetch_timeout())
        .context("Failed to build audio asset client")?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let player_ctx = PlayerContext::new(
        &config.player,
        Arc::new(fetcher),
        Arc::new(CpalSink::new()),
        event_tx,
    );

    let ui_state = UiState::new(&config.catalog.styles, &config.catalog.currency, &config.site.base_url);
    let app_model = AppModel::new(ui_state);
    app_model
        .set_style_filter(StyleFilter::parse(&config.catalog.initial_style))
        .await;
    let model = Arc::new(Mutex::new(app_model));
    let controller = AppController::new(model.clone(), Arc::new(store), player_ctx);

    controller.start_player_event_listener(event_rx);

    let controller_for_load = controller.clone();
    tokio::spawn(async move {
        controller_for_load.load_listings().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model.clone(), controller.clone()).await;

    controller.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("BeatsMarket Storefront shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        // Get current state
        let (ui_state, listings, previews, should_quit) = {
            let model_guard = model.lock().await;

            // Auto-clear old errors (after 5 seconds)
            model_guard.auto_clear_old_errors().await;

            (
                model_guard.get_ui_state().await,
                model_guard.get_listings_state().await,
                model_guard.get_preview_statuses().await,
                model_guard.should_quit().await,
            )
        };

        terminal.draw(|f| {
            AppView::render(f, &ui_state, &listings, &previews);
        })?;

        // Short poll keeps the preview gauge moving
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
