// Application state and orchestration logic.
//
// The app task owns the roster store, the leaderboard view and the display
// settings. It applies user commands from the TUI and storage changes written
// by other scoreboard processes, and pushes UI updates to the render loop.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use scoreboard_core::config::Config;
use scoreboard_core::games::{self, GameKind};
use scoreboard_core::ranking::Leaderboard;
use scoreboard_core::store::{RosterStore, StoreError};
use scoreboard_core::visibility::VisibilityCoordinator;
use scoreboard_core::watch::StorageChange;

use crate::protocol::{AppSnapshot, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub config: Config,
    pub store: RosterStore,
    pub board: Leaderboard,
    pub visibility: VisibilityCoordinator,
    /// Game image file names offered by the image picker.
    pub images: Vec<String>,
    rng: StdRng,
}

impl AppState {
    pub fn new(
        config: Config,
        store: RosterStore,
        visibility: VisibilityCoordinator,
        images: Vec<String>,
    ) -> Self {
        let board = Leaderboard::new(store.players());
        AppState {
            config,
            store,
            board,
            visibility,
            images,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source, for reproducible draws.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn build_snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            leaderboard: self.board.entries(),
            roster: self.store.players().to_vec(),
            settings: self.visibility.settings().clone(),
            odds: games::lottery_odds(self.store.players()),
            images: self.images.clone(),
            money_step: self.config.scoring.money_step,
        }
    }

    /// Forward every settings change to the TUI.
    pub fn forward_settings(&mut self, ui_tx: mpsc::Sender<UiUpdate>) {
        self.visibility.subscribe(move |settings| {
            let _ = ui_tx.try_send(UiUpdate::Settings(settings.clone()));
        });
    }

    /// Clear the announced winner if it is one of `ids`.
    fn forget_winner(&mut self, ids: &[String]) -> anyhow::Result<()> {
        let consumed = self
            .visibility
            .settings()
            .winning_player_id
            .as_ref()
            .is_some_and(|w| ids.contains(w));
        if consumed {
            self.visibility.clear_winner()?;
        }
        Ok(())
    }

    /// The image after the current one, or none after the last.
    fn next_image(&self) -> Option<String> {
        if self.images.is_empty() {
            return None;
        }
        let current = self.visibility.settings().selected_image_path.as_deref();
        let index = self
            .images
            .iter()
            .position(|file| Some(self.config.image_path(file).as_str()) == current);
        let next = match index {
            None => Some(0),
            Some(i) if i + 1 < self.images.len() => Some(i + 1),
            Some(_) => None,
        };
        next.map(|i| self.config.image_path(&self.images[i]))
    }

    fn display_name(&self, id: &str) -> String {
        self.store
            .get(id)
            .map(|p| p.display_name())
            .unwrap_or_else(|| id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on two channels using `tokio::select!`:
/// 1. User commands from the TUI
/// 2. Storage changes reported by the watcher
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut change_rx: mpsc::Receiver<StorageChange>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");
    state.forward_settings(ui_tx.clone());
    send_snapshot(&state, &ui_tx).await;

    let mut watching = true;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        if let Err(e) = handle_user_command(&mut state, cmd, &ui_tx).await {
                            warn!("Command failed: {e:#}");
                            let _ = ui_tx.send(UiUpdate::Notice(format!("Error: {e}"))).await;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            change = change_rx.recv(), if watching => {
                match change {
                    Some(change) => {
                        if let Err(e) = handle_storage_change(&mut state, change, &ui_tx).await {
                            warn!("Failed to apply storage change: {e:#}");
                        }
                    }
                    None => {
                        info!("Storage watcher stopped");
                        watching = false;
                    }
                }
            }
        }
    }

    Ok(())
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let snapshot = state.build_snapshot();
    let _ = ui_tx.send(UiUpdate::StateSnapshot(Box::new(snapshot))).await;
}

/// Handle a user command from the TUI.
pub async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) -> anyhow::Result<()> {
    match cmd {
        UserCommand::Resort => {
            state.board.resort();
            info!("Leaderboard re-sorted");
        }
        UserCommand::StepMoney { id, up } => {
            let step = state.config.scoring.money_step;
            let delta = if up { step } else { -step };
            if state.store.adjust_money(&id, delta)? {
                state.board.sync(state.store.players());
            }
        }
        UserCommand::SetMoney { id, text } => {
            if state.store.set_money_text(&id, &text)? {
                state.board.sync(state.store.players());
            }
        }
        UserCommand::MakeTeam(ids) => match state.store.merge(&ids) {
            Ok(team) => {
                state.board.rebuild(state.store.players());
                state.forget_winner(&ids)?;
                let _ = ui_tx.send(UiUpdate::ClearSelection).await;
                let _ = ui_tx
                    .send(UiUpdate::Notice(format!("Formed team {}", team.display_name())))
                    .await;
            }
            Err(StoreError::Compose(e)) => {
                info!("Team rejected: {e}");
                let _ = ui_tx.send(UiUpdate::Notice(e.to_string())).await;
                return Ok(());
            }
            Err(StoreError::Storage(e)) => return Err(e),
        },
        UserCommand::BreakTeam(team_id) => match state.store.split(&team_id) {
            Ok(singles) => {
                state.board.rebuild(state.store.players());
                state.forget_winner(std::slice::from_ref(&team_id))?;
                let _ = ui_tx.send(UiUpdate::ClearSelection).await;
                let _ = ui_tx
                    .send(UiUpdate::Notice(format!("Split into {} players", singles.len())))
                    .await;
            }
            Err(StoreError::Compose(e)) => {
                info!("Split rejected: {e}");
                let _ = ui_tx.send(UiUpdate::Notice(e.to_string())).await;
                return Ok(());
            }
            Err(StoreError::Storage(e)) => return Err(e),
        },
        UserCommand::SetInput { id, text } => {
            if state.store.set_input(&id, &text)? {
                state.board.sync(state.store.players());
            }
        }
        UserCommand::ToggleSecret => {
            // Settings listeners update the TUI.
            state.visibility.toggle_secret()?;
            return Ok(());
        }
        UserCommand::RunGame(kind) => {
            let winner = games::resolve(kind, state.store.players(), &mut state.rng);
            let notice = match winner {
                Some(id) => {
                    let name = state.display_name(&id);
                    info!("{} winner: {} ({})", kind.label(), name, id);
                    state.visibility.record_winner(id)?;
                    format!("{} winner: {}", kind.label(), name)
                }
                None => {
                    // The previous announcement stays up.
                    info!("{}: no valid entries", kind.label());
                    match kind {
                        GameKind::TokenDraw => "No valid token entries".to_string(),
                        GameKind::LowestUniqueBid => "No unique bid".to_string(),
                    }
                }
            };
            let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
            return Ok(());
        }
        UserCommand::CycleImage => {
            let next = state.next_image();
            state.visibility.select_image(next)?;
            return Ok(());
        }
        UserCommand::ClearInputs => {
            state.store.clear_inputs()?;
            state.board.sync(state.store.players());
        }
        UserCommand::Quit => {
            // Handled in the main loop
            return Ok(());
        }
    }

    send_snapshot(state, ui_tx).await;
    Ok(())
}

/// Re-read whatever another process changed.
async fn handle_storage_change(
    state: &mut AppState,
    change: StorageChange,
    ui_tx: &mpsc::Sender<UiUpdate>,
) -> anyhow::Result<()> {
    match change {
        StorageChange::Roster => {
            if state.store.reload()? {
                state.board.sync(state.store.players());
                send_snapshot(state, ui_tx).await;
            }
        }
        StorageChange::Settings => {
            state.visibility.refresh()?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
