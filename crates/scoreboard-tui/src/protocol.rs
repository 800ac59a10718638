// Message types passed between the app task and the TUI render loop.

use clap::ValueEnum;
use scoreboard_core::games::GameKind;
use scoreboard_core::player::Player;
use scoreboard_core::ranking::RankedEntry;
use scoreboard_core::visibility::Settings;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The three screens of the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ViewMode {
    /// Ranked money table for the operator.
    #[default]
    Leaderboard,
    /// Read-only audience display of the current game round.
    Game,
    /// Game controls: inputs, secret mode, draws.
    Admin,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Leaderboard => "Leaderboard",
            ViewMode::Game => "Game",
            ViewMode::Admin => "Admin",
        }
    }

    /// The view after this one. Admin is skipped unless unlocked.
    pub fn next(self, admin_unlocked: bool) -> ViewMode {
        match self {
            ViewMode::Leaderboard => ViewMode::Game,
            ViewMode::Game if admin_unlocked => ViewMode::Admin,
            ViewMode::Game | ViewMode::Admin => ViewMode::Leaderboard,
        }
    }
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Re-sort the leaderboard by money.
    Resort,
    /// Add (`up`) or remove one money step.
    StepMoney { id: String, up: bool },
    /// Free-text money edit.
    SetMoney { id: String, text: String },
    /// Merge the selected players, in selection order.
    MakeTeam(Vec<String>),
    BreakTeam(String),
    SetInput { id: String, text: String },
    ToggleSecret,
    RunGame(GameKind),
    CycleImage,
    ClearInputs,
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

/// Everything the views need to draw.
#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    /// Leaderboard order with ranks.
    pub leaderboard: Vec<RankedEntry>,
    /// Roster order, used by the game and admin views.
    pub roster: Vec<Player>,
    pub settings: Settings,
    /// Token-game odds per participating id.
    pub odds: Vec<(String, f64)>,
    pub images: Vec<String>,
    pub money_step: f64,
}

#[derive(Debug, Clone)]
pub enum UiUpdate {
    StateSnapshot(Box<AppSnapshot>),
    /// Settings changed without a roster change.
    Settings(Settings),
    /// One-line message for the operator (rejections, game results).
    Notice(String),
    /// The selected players no longer exist.
    ClearSelection,
}
