// Admin widget: operator table with raw inputs, token-game odds, and the
// inline input editor.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use scoreboard_core::display::{display_rows, Audience};

use crate::tui::{EditTarget, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let settings = &state.snapshot.settings;
    let rows = display_rows(&state.snapshot.roster, settings, Audience::Operator);

    let table_rows: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let input = match &state.edit {
                Some(edit) if edit.target == EditTarget::Input && edit.id == row.id => {
                    format!("{}▏", edit.buffer)
                }
                _ => row.input.clone().unwrap_or_default(),
            };
            let odds = odds_for(&state.snapshot.odds, &row.id)
                .map(format_odds)
                .unwrap_or_default();

            let mut style = Style::default();
            if row.is_winner {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            if i == state.cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            Row::new(vec![
                Cell::from(if row.is_winner { "★" } else { "" }),
                Cell::from(row.name),
                Cell::from(row.money),
                Cell::from(input),
                Cell::from(odds),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    let table = Table::new(table_rows, widths)
        .header(
            Row::new(vec!["", "Player", "Money", "Input", "Odds"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title(state)));
    frame.render_widget(table, area);
}

fn title(state: &ViewState) -> String {
    let settings = &state.snapshot.settings;
    let secret = if settings.secret_mode { "on" } else { "off" };
    let winner = settings
        .winning_player_id
        .as_deref()
        .and_then(|id| state.snapshot.roster.iter().find(|p| p.id == id))
        .map(|p| p.display_name())
        .unwrap_or_else(|| "none".to_string());
    format!("Admin | secret: {secret} | winner: {winner}")
}

fn odds_for(odds: &[(String, f64)], id: &str) -> Option<f64> {
    odds.iter().find(|(o, _)| o == id).map(|(_, p)| *p)
}

/// `0.125` -> `"12.5%"`.
pub fn format_odds(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
