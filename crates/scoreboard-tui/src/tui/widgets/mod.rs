// TUI widget modules, one per screen region.

pub mod admin;
pub mod game;
pub mod leaderboard;
pub mod status_bar;

#[cfg(test)]
pub(crate) fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}
