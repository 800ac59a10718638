// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the app task's state. The app pushes
// `UiUpdate` messages over an mpsc channel; the TUI applies them to
// `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{AppSnapshot, UiUpdate, UserCommand, ViewMode};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which field an inline edit writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Money,
    Input,
}

/// An inline text edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub target: EditTarget,
    pub id: String,
    pub buffer: String,
}

/// TUI-local state: the latest app snapshot plus cursor, selection and edit
/// state, none of which the app task knows about.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: ViewMode,
    pub admin_unlocked: bool,
    pub snapshot: AppSnapshot,
    /// Row index in the active view.
    pub cursor: usize,
    /// Leaderboard selection, in the order players were picked.
    pub selected: Vec<String>,
    pub edit: Option<EditState>,
    pub notice: Option<String>,
}

impl ViewState {
    pub fn new(view: ViewMode, admin_unlocked: bool) -> Self {
        let view = if view == ViewMode::Admin && !admin_unlocked {
            ViewMode::Game
        } else {
            view
        };
        ViewState {
            view,
            admin_unlocked,
            snapshot: AppSnapshot::default(),
            cursor: 0,
            selected: Vec::new(),
            edit: None,
            notice: None,
        }
    }

    /// Ids of the rows the cursor moves over in the active view.
    pub fn row_ids(&self) -> Vec<&str> {
        match self.view {
            ViewMode::Leaderboard => self
                .snapshot
                .leaderboard
                .iter()
                .map(|e| e.player.id.as_str())
                .collect(),
            ViewMode::Admin => self.snapshot.roster.iter().map(|p| p.id.as_str()).collect(),
            ViewMode::Game => Vec::new(),
        }
    }

    /// Id under the cursor.
    pub fn current_id(&self) -> Option<String> {
        self.row_ids().get(self.cursor).map(|id| id.to_string())
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    fn clamp_cursor(&mut self) {
        let rows = self.row_ids().len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }

    /// Replace the snapshot, dropping selections and edits whose player is gone.
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        self.snapshot = snapshot;
        let exists = |id: &str| self.snapshot.roster.iter().any(|p| p.id == id);
        let kept: Vec<String> = self.selected.iter().filter(|id| exists(id)).cloned().collect();
        let edit_gone = self.edit.as_ref().is_some_and(|e| !exists(&e.id));
        self.selected = kept;
        if edit_gone {
            self.edit = None;
        }
        self.clamp_cursor();
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::StateSnapshot(snapshot) => state.apply_snapshot(*snapshot),
        UiUpdate::Settings(settings) => state.snapshot.settings = settings,
        UiUpdate::Notice(message) => state.notice = Some(message),
        UiUpdate::ClearSelection => state.selected.clear(),
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.view {
        ViewMode::Leaderboard => widgets::leaderboard::render(frame, layout.main_panel, state),
        ViewMode::Game => widgets::game::render(frame, layout.main_panel, state),
        ViewMode::Admin => widgets::admin::render(frame, layout.main_panel, state),
    }

    let help = Paragraph::new(help_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, layout.help_bar);
}

fn help_text(state: &ViewState) -> &'static str {
    if state.edit.is_some() {
        return " Enter:save  Esc:cancel";
    }
    match state.view {
        ViewMode::Leaderboard => {
            " ↑↓:move  Space:select  t:team  b:break  +/-:money  e:edit  r:re-sort  Tab:view  q:quit"
        }
        ViewMode::Game => " Tab:view  q:quit",
        ViewMode::Admin => {
            " ↑↓:move  e:input  s:secret  d:token draw  u:unique bid  i:image  c:clear  Tab:view  q:quit"
        }
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    view: ViewMode,
    admin_unlocked: bool,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(view, admin_unlocked);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App task is shutting down
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_snapshot() -> AppSnapshot {
    use scoreboard_core::player::Player;
    use scoreboard_core::ranking::Leaderboard;

    let mut team = Player::team("t", vec!["Bo".into(), "Cy".into()], 40.0, None);
    team.player_input = Some("5".into());
    let mut ann = Player::single("a", "Ann", 10.0);
    ann.player_input = Some("12".into());
    let roster = vec![ann, Player::single("d", "Dee", 25.0), team];
    AppSnapshot {
        leaderboard: Leaderboard::new(&roster).entries(),
        odds: scoreboard_core::games::lottery_odds(&roster),
        roster,
        settings: Default::default(),
        images: vec!["bowl.png".into()],
        money_step: 10.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
