// Game widget: the audience display. Inputs are masked and the winner hidden
// while secret mode is on.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;
use scoreboard_core::display::{display_rows, Audience};

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let settings = &state.snapshot.settings;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let image = settings
        .selected_image_path
        .as_deref()
        .unwrap_or("(no image selected)");
    let header = Paragraph::new(Line::from(image.to_string()))
        .block(Block::default().borders(Borders::ALL).title("Game Image"));
    frame.render_widget(header, chunks[0]);

    let rows = display_rows(&state.snapshot.roster, settings, Audience::Public);
    let winner = rows.iter().find(|r| r.is_winner).map(|r| r.name.clone());

    let table_rows: Vec<Row> = rows
        .into_iter()
        .map(|row| {
            let style = if row.is_winner {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if row.is_winner { "★" } else { "" };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(format!("({}) {}", row.initials, row.name)),
                Cell::from(row.money),
                Cell::from(row.input.unwrap_or_else(|| "-".to_string())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(16),
        Constraint::Length(14),
        Constraint::Length(12),
    ];

    let title = match winner {
        Some(name) => format!("Players | Winner: {name}"),
        None => "Players".to_string(),
    };
    let table = Table::new(table_rows, widths)
        .header(
            Row::new(vec!["", "Player", "Money", "Input"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, chunks[1]);
}
