// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app task, or into local ViewState mutations (cursor, selection, inline
// edits, view switching).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use scoreboard_core::games::GameKind;

use super::{EditState, EditTarget, ViewState};
use crate::protocol::{UserCommand, ViewMode};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app task. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits, even mid-edit
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.edit.is_some() {
        return handle_edit_mode(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('q') => return Some(UserCommand::Quit),
        KeyCode::Tab => {
            let next = view_state.view.next(view_state.admin_unlocked);
            switch_view(view_state, next);
            return None;
        }
        KeyCode::Esc => {
            view_state.notice = None;
            view_state.selected.clear();
            return None;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.cursor = view_state.cursor.saturating_sub(1);
            return None;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let rows = view_state.row_ids().len();
            if view_state.cursor + 1 < rows {
                view_state.cursor += 1;
            }
            return None;
        }
        _ => {}
    }

    match view_state.view {
        ViewMode::Leaderboard => handle_leaderboard(key_event, view_state),
        ViewMode::Admin => handle_admin(key_event, view_state),
        ViewMode::Game => None,
    }
}

fn switch_view(view_state: &mut ViewState, view: ViewMode) {
    view_state.view = view;
    view_state.cursor = 0;
    view_state.edit = None;
}

fn handle_leaderboard(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char(' ') => {
            if let Some(id) = view_state.current_id() {
                toggle_selection(view_state, id);
            }
            None
        }
        KeyCode::Char('r') => Some(UserCommand::Resort),
        KeyCode::Char('t') => {
            if view_state.selected.len() < 2 {
                view_state.notice = Some("Select at least two players to make a team".into());
                return None;
            }
            Some(UserCommand::MakeTeam(view_state.selected.clone()))
        }
        KeyCode::Char('b') => match selected_team(view_state) {
            Some(id) => Some(UserCommand::BreakTeam(id)),
            None => {
                view_state.notice = Some("Select exactly one team to break".into());
                None
            }
        },
        KeyCode::Char('+') | KeyCode::Char('=') => step_money(view_state, true),
        KeyCode::Char('-') => step_money(view_state, false),
        KeyCode::Char('e') | KeyCode::Enter => {
            let id = view_state.current_id()?;
            let current = view_state
                .snapshot
                .roster
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.money_earned.to_string())
                .unwrap_or_default();
            view_state.edit = Some(EditState {
                target: EditTarget::Money,
                id,
                buffer: current,
            });
            None
        }
        _ => None,
    }
}

fn handle_admin(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('e') | KeyCode::Enter => {
            let id = view_state.current_id()?;
            let current = view_state
                .snapshot
                .roster
                .iter()
                .find(|p| p.id == id)
                .and_then(|p| p.player_input.clone())
                .unwrap_or_default();
            view_state.edit = Some(EditState {
                target: EditTarget::Input,
                id,
                buffer: current,
            });
            None
        }
        KeyCode::Char('s') => Some(UserCommand::ToggleSecret),
        KeyCode::Char('d') => Some(UserCommand::RunGame(GameKind::TokenDraw)),
        KeyCode::Char('u') => Some(UserCommand::RunGame(GameKind::LowestUniqueBid)),
        KeyCode::Char('i') => Some(UserCommand::CycleImage),
        KeyCode::Char('c') => Some(UserCommand::ClearInputs),
        _ => None,
    }
}

/// Keys while an inline edit is open: text goes to the buffer, Enter commits,
/// Esc discards.
fn handle_edit_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.edit = None;
            None
        }
        KeyCode::Enter => {
            let EditState { target, id, buffer } = view_state.edit.take()?;
            Some(match target {
                EditTarget::Money => UserCommand::SetMoney { id, text: buffer },
                EditTarget::Input => UserCommand::SetInput { id, text: buffer },
            })
        }
        KeyCode::Backspace => {
            if let Some(edit) = view_state.edit.as_mut() {
                edit.buffer.pop();
            }
            None
        }
        KeyCode::Char(c) => {
            if let Some(edit) = view_state.edit.as_mut() {
                edit.buffer.push(c);
            }
            None
        }
        _ => None,
    }
}

fn toggle_selection(view_state: &mut ViewState, id: String) {
    if let Some(pos) = view_state.selected.iter().position(|s| *s == id) {
        view_state.selected.remove(pos);
    } else {
        view_state.selected.push(id);
    }
}

/// The single selected entry, if it is a team.
fn selected_team(view_state: &ViewState) -> Option<String> {
    let [id] = view_state.selected.as_slice() else {
        return None;
    };
    view_state
        .snapshot
        .roster
        .iter()
        .find(|p| &p.id == id && p.is_team())
        .map(|p| p.id.clone())
}

fn step_money(view_state: &ViewState, up: bool) -> Option<UserCommand> {
    let id = view_state.current_id()?;
    Some(UserCommand::StepMoney { id, up })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::sample_snapshot;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn state(view: ViewMode) -> ViewState {
        let mut state = ViewState::new(view, true);
        state.apply_snapshot(sample_snapshot());
        state
    }

    // -- Global keys --

    #[test]
    fn release_events_are_ignored() {
        let mut s = state(ViewMode::Leaderboard);
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key(release, &mut s), None);
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let mut s = state(ViewMode::Game);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut s), Some(UserCommand::Quit));
        assert_eq!(handle_key(ctrl_key(KeyCode::Char('c')), &mut s), Some(UserCommand::Quit));
    }

    #[test]
    fn tab_cycles_views_and_skips_locked_admin() {
        let mut s = state(ViewMode::Leaderboard);
        s.cursor = 2;
        handle_key(key(KeyCode::Tab), &mut s);
        assert_eq!(s.view, ViewMode::Game);
        assert_eq!(s.cursor, 0);
        handle_key(key(KeyCode::Tab), &mut s);
        assert_eq!(s.view, ViewMode::Admin);

        let mut locked = ViewState::new(ViewMode::Game, false);
        handle_key(key(KeyCode::Tab), &mut locked);
        assert_eq!(locked.view, ViewMode::Leaderboard);
    }

    #[test]
    fn cursor_stays_within_rows() {
        let mut s = state(ViewMode::Leaderboard);
        handle_key(key(KeyCode::Up), &mut s);
        assert_eq!(s.cursor, 0);
        for _ in 0..5 {
            handle_key(key(KeyCode::Char('j')), &mut s);
        }
        assert_eq!(s.cursor, 2);
        handle_key(key(KeyCode::Char('k')), &mut s);
        assert_eq!(s.cursor, 1);
    }

    // -- Leaderboard --

    #[test]
    fn space_toggles_selection_in_pick_order() {
        let mut s = state(ViewMode::Leaderboard);
        // Leaderboard order is t, d, a
        handle_key(key(KeyCode::Down), &mut s);
        handle_key(key(KeyCode::Char(' ')), &mut s);
        handle_key(key(KeyCode::Down), &mut s);
        handle_key(key(KeyCode::Char(' ')), &mut s);
        assert_eq!(s.selected, vec!["d", "a"]);

        handle_key(key(KeyCode::Char(' ')), &mut s);
        assert_eq!(s.selected, vec!["d"]);
    }

    #[test]
    fn make_team_needs_two_selected() {
        let mut s = state(ViewMode::Leaderboard);
        s.selected = vec!["d".into()];
        assert_eq!(handle_key(key(KeyCode::Char('t')), &mut s), None);
        assert!(s.notice.is_some());

        s.selected.push("a".into());
        assert_eq!(
            handle_key(key(KeyCode::Char('t')), &mut s),
            Some(UserCommand::MakeTeam(vec!["d".into(), "a".into()]))
        );
    }

    #[test]
    fn break_team_needs_exactly_one_selected_team() {
        let mut s = state(ViewMode::Leaderboard);
        s.selected = vec!["d".into()];
        assert_eq!(handle_key(key(KeyCode::Char('b')), &mut s), None);

        s.selected = vec!["t".into(), "d".into()];
        assert_eq!(handle_key(key(KeyCode::Char('b')), &mut s), None);

        s.selected = vec!["t".into()];
        assert_eq!(
            handle_key(key(KeyCode::Char('b')), &mut s),
            Some(UserCommand::BreakTeam("t".into()))
        );
    }

    #[test]
    fn money_keys_target_cursor_row() {
        let mut s = state(ViewMode::Leaderboard);
        s.cursor = 1;
        assert_eq!(
            handle_key(key(KeyCode::Char('+')), &mut s),
            Some(UserCommand::StepMoney { id: "d".into(), up: true })
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('-')), &mut s),
            Some(UserCommand::StepMoney { id: "d".into(), up: false })
        );
        assert_eq!(handle_key(key(KeyCode::Char('r')), &mut s), Some(UserCommand::Resort));
    }

    #[test]
    fn money_edit_commits_on_enter() {
        let mut s = state(ViewMode::Leaderboard);
        s.cursor = 2;
        handle_key(key(KeyCode::Char('e')), &mut s);
        let edit = s.edit.as_ref().unwrap();
        assert_eq!(edit.target, EditTarget::Money);
        assert_eq!(edit.buffer, "10");

        handle_key(key(KeyCode::Backspace), &mut s);
        handle_key(key(KeyCode::Char('5')), &mut s);
        // q is text while editing
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut s), None);
        handle_key(key(KeyCode::Backspace), &mut s);

        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut s),
            Some(UserCommand::SetMoney { id: "a".into(), text: "15".into() })
        );
        assert!(s.edit.is_none());
    }

    #[test]
    fn esc_cancels_edit_then_clears_selection() {
        let mut s = state(ViewMode::Leaderboard);
        s.selected = vec!["a".into()];
        s.notice = Some("old".into());
        handle_key(key(KeyCode::Enter), &mut s);
        assert!(s.edit.is_some());

        assert_eq!(handle_key(key(KeyCode::Esc), &mut s), None);
        assert!(s.edit.is_none());
        assert_eq!(s.selected, vec!["a"]);

        handle_key(key(KeyCode::Esc), &mut s);
        assert!(s.selected.is_empty());
        assert!(s.notice.is_none());
    }

    // -- Admin --

    #[test]
    fn admin_keys_send_game_commands() {
        let mut s = state(ViewMode::Admin);
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut s), Some(UserCommand::ToggleSecret));
        assert_eq!(
            handle_key(key(KeyCode::Char('d')), &mut s),
            Some(UserCommand::RunGame(GameKind::TokenDraw))
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('u')), &mut s),
            Some(UserCommand::RunGame(GameKind::LowestUniqueBid))
        );
        assert_eq!(handle_key(key(KeyCode::Char('i')), &mut s), Some(UserCommand::CycleImage));
        assert_eq!(handle_key(key(KeyCode::Char('c')), &mut s), Some(UserCommand::ClearInputs));
    }

    #[test]
    fn admin_input_edit_prefills_current_input() {
        let mut s = state(ViewMode::Admin);
        // Admin rows follow roster order: a, d, t
        handle_key(key(KeyCode::Char('e')), &mut s);
        assert_eq!(s.edit.as_ref().unwrap().buffer, "12");
        handle_key(key(KeyCode::Char('0')), &mut s);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut s),
            Some(UserCommand::SetInput { id: "a".into(), text: "120".into() })
        );
    }

    #[test]
    fn game_view_ignores_operator_keys() {
        let mut s = state(ViewMode::Game);
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut s), None);
        assert_eq!(handle_key(key(KeyCode::Char('r')), &mut s), None);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut s), None);
        assert!(s.edit.is_none());
    }
}
