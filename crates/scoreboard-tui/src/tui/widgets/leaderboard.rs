// Leaderboard widget: ranked money table with cursor, selection marks and
// the inline money editor.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use scoreboard_core::display::format_money;

use crate::tui::{EditTarget, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("#"),
        Cell::from("Player"),
        Cell::from("Money"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = if state.snapshot.leaderboard.is_empty() {
        vec![Row::new(vec![Cell::from(""), Cell::from(""), Cell::from("No players")])]
    } else {
        state
            .snapshot
            .leaderboard
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let player = &entry.player;
                let money = match &state.edit {
                    Some(edit) if edit.target == EditTarget::Money && edit.id == player.id => {
                        format!("{}▏", edit.buffer)
                    }
                    _ => format_money(player.money_earned),
                };
                let name = if player.is_team() {
                    format!("{} [team]", player.display_name())
                } else {
                    player.display_name()
                };

                let mut style = Style::default();
                if state.is_selected(&player.id) {
                    style = style.fg(Color::Cyan);
                }
                if i == state.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }

                Row::new(vec![
                    Cell::from(row_marker(state.is_selected(&player.id))),
                    Cell::from(entry.rank.to_string()),
                    Cell::from(name),
                    Cell::from(money),
                ])
                .style(style)
            })
            .collect()
    };

    let widths = [
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(14),
    ];

    let title = match state.selected.len() {
        0 => "Leaderboard".to_string(),
        n => format!("Leaderboard ({n} selected)"),
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn row_marker(selected: bool) -> &'static str {
    if selected {
        "[x]"
    } else {
        "[ ]"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
