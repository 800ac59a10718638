// Scoreboard entry point.
//
// Startup sequence:
// 1. Parse command-line flags
// 2. Initialize tracing (log to file, not terminal)
// 3. Load config
// 4. Open database
// 5. Load roster, game images and display settings
// 6. Create mpsc channels
// 7. Spawn storage watcher task
// 8. Spawn app logic task
// 9. Run the TUI until the user quits
// 10. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use scoreboard_core::config;
use scoreboard_core::db::Database;
use scoreboard_core::seed::{self, SeedSource};
use scoreboard_core::store::RosterStore;
use scoreboard_core::visibility::VisibilityCoordinator;
use scoreboard_core::watch::StorageWatcher;
use scoreboard_tui::app;
use scoreboard_tui::protocol::ViewMode;
use scoreboard_tui::tui;

/// Terminal scoreboard for live game nights.
#[derive(Debug, Parser)]
#[command(name = "scoreboard", version, about)]
struct Cli {
    /// Screen to open on.
    #[arg(long, value_enum, default_value_t = ViewMode::Leaderboard)]
    view: ViewMode,

    /// Key that unlocks the admin view.
    #[arg(long)]
    admin_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse command-line flags
    let cli = Cli::parse();

    // 2. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Scoreboard starting up");

    // 3. Load config
    let config = config::load_config().context("failed to load configuration")?;
    let admin_unlocked = config.admin_unlocked(cli.admin_key.as_deref());
    let view = if cli.view == ViewMode::Admin && !admin_unlocked {
        warn!("Admin view requested without a valid key; opening the game view");
        ViewMode::Game
    } else {
        cli.view
    };

    // 4. Open database
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Arc::new(
        Database::open(&db_path.to_string_lossy()).context("failed to open database")?,
    );
    info!("Database opened at {}", db_path.display());

    // 5. Load roster, game images and display settings
    let seed_source = SeedSource::new(&config.seed.players, &config.seed.images);
    let store = RosterStore::load(Arc::clone(&db), &seed_source)
        .await
        .context("failed to load roster")?;
    info!("Roster ready with {} entries", store.players().len());

    let images = seed::load_images(&seed_source).await;
    info!("{} game images available", images.len());

    let visibility =
        VisibilityCoordinator::load(Arc::clone(&db)).context("failed to load display settings")?;

    // 6. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let (change_tx, change_rx) = mpsc::channel(16);

    // 7. Spawn storage watcher task
    let watcher = StorageWatcher::new(Arc::clone(&db), config.poll_interval(), change_tx);
    let watch_handle = tokio::spawn(watcher.run());

    // 8. Spawn app logic task
    let app_state = app::AppState::new(config, store, visibility, images);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, change_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 9. Run the TUI event loop until the user presses 'q' or Ctrl+C
    info!("Application ready in {} view", view.label());
    if let Err(e) = tui::run(ui_rx, cmd_tx, view, admin_unlocked).await {
        error!("TUI error: {}", e);
    }

    // 10. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    watch_handle.abort();

    info!("Scoreboard shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("scoreboard.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scoreboard_core=info,scoreboard_tui=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
