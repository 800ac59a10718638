// Status bar widget: view tabs, secret-mode indicator, last notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::ViewMode;
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [tab bar] | [secret indicator] | [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::raw(" ")];
    spans.extend(tab_spans(state.view, state.admin_unlocked));

    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    let (label, color) = secret_indicator(state.snapshot.settings.secret_mode);
    spans.push(Span::styled(label, Style::default().fg(color)));

    if let Some(notice) = &state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn secret_indicator(secret_mode: bool) -> (&'static str, Color) {
    if secret_mode {
        ("SECRET", Color::Red)
    } else {
        ("PUBLIC", Color::Green)
    }
}

/// One `[Label]` span per reachable view, the active one highlighted.
pub fn tab_spans(active: ViewMode, admin_unlocked: bool) -> Vec<Span<'static>> {
    let mut views = vec![ViewMode::Leaderboard, ViewMode::Game];
    if admin_unlocked {
        views.push(ViewMode::Admin);
    }

    let mut spans = Vec::new();
    for view in views {
        let style = if view == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}]", view.label()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
