// Leaderboard ordering: a money-descending view that only re-sorts when asked.

use std::collections::HashSet;

use crate::player::Player;

/// A player with its 1-based position in the current leaderboard view.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub player: Player,
}

/// An independently ordered copy of the roster.
///
/// Money edits flow in through [`Leaderboard::sync`], which updates values
/// where they stand. Order only changes on [`Leaderboard::resort`] or a full
/// [`Leaderboard::rebuild`], so a score change does not make rows jump while
/// the operator is still adjusting them.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    order: Vec<Player>,
}

impl Leaderboard {
    /// Build a sorted view of `players`.
    pub fn new(players: &[Player]) -> Self {
        let mut board = Leaderboard {
            order: players.to_vec(),
        };
        board.resort();
        board
    }

    /// Stable sort by money, highest first. Ties keep their current order.
    pub fn resort(&mut self) {
        self.order
            .sort_by(|a, b| b.money_earned.total_cmp(&a.money_earned));
    }

    /// Replace the view with a freshly sorted copy of `players`. Used after
    /// changes to the roster's membership (bootstrap, merge, split).
    pub fn rebuild(&mut self, players: &[Player]) {
        *self = Leaderboard::new(players);
    }

    /// Copy current values from `players` into the view without reordering.
    ///
    /// Entries whose id is gone are dropped; ids the view has not seen are
    /// appended in roster order.
    pub fn sync(&mut self, players: &[Player]) {
        self.order.retain(|entry| players.iter().any(|p| p.id == entry.id));
        for entry in &mut self.order {
            if let Some(current) = players.iter().find(|p| p.id == entry.id) {
                entry.clone_from(current);
            }
        }

        let known: HashSet<String> = self.order.iter().map(|p| p.id.clone()).collect();
        self.order.extend(
            players
                .iter()
                .filter(|p| !known.contains(&p.id))
                .cloned(),
        );
    }

    /// The view with ranks assigned from position.
    pub fn entries(&self) -> Vec<RankedEntry> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, player)| RankedEntry {
                rank: i + 1,
                player: player.clone(),
            })
            .collect()
    }

    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|p| p.id == id).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(board: &Leaderboard) -> Vec<String> {
        board.entries().into_iter().map(|e| e.player.id).collect()
    }

    fn xyz() -> Vec<Player> {
        vec![
            Player::single("x", "X", 5.0),
            Player::single("y", "Y", 5.0),
            Player::single("z", "Z", 1.0),
        ]
    }

    #[test]
    fn empty_roster_gives_empty_view() {
        let board = Leaderboard::new(&[]);
        assert!(board.is_empty());
        assert!(board.entries().is_empty());
    }

    #[test]
    fn ties_keep_insertion_order() {
        let board = Leaderboard::new(&xyz());
        let entries = board.entries();
        assert_eq!(entries[0].player.id, "x");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[1].player.id, "y");
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[2].player.id, "z");
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn sync_updates_value_without_reordering() {
        let mut roster = xyz();
        let mut board = Leaderboard::new(&roster);

        roster[2].money_earned = 100.0;
        board.sync(&roster);

        assert_eq!(board.rank_of("z"), Some(3));
        let z = &board.entries()[2];
        assert!((z.player.money_earned - 100.0).abs() < f64::EPSILON);

        board.resort();
        assert_eq!(ids(&board), vec!["z", "x", "y"]);
    }

    #[test]
    fn resort_is_stable_against_current_view_order() {
        let roster = vec![
            Player::single("a", "A", 1.0),
            Player::single("b", "B", 9.0),
        ];
        let mut board = Leaderboard::new(&roster);
        assert_eq!(ids(&board), vec!["b", "a"]);

        // a catches up; on re-sort the tie keeps the view's order (b first)
        let mut roster = roster;
        roster[0].money_earned = 9.0;
        board.sync(&roster);
        board.resort();
        assert_eq!(ids(&board), vec!["b", "a"]);
    }

    #[test]
    fn sync_drops_removed_and_appends_new() {
        let mut roster = xyz();
        let mut board = Leaderboard::new(&roster);

        roster.remove(0);
        roster.push(Player::single("w", "W", 50.0));
        board.sync(&roster);

        assert_eq!(ids(&board), vec!["y", "z", "w"]);
    }

    #[test]
    fn rebuild_sorts_fresh() {
        let mut board = Leaderboard::new(&xyz());
        let roster = vec![
            Player::single("z", "Z", 1.0),
            Player::single("t", "T", 12.0),
        ];
        board.rebuild(&roster);
        assert_eq!(ids(&board), vec!["t", "z"]);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn rank_of_unknown_is_none() {
        let board = Leaderboard::new(&xyz());
        assert_eq!(board.rank_of("nobody"), None);
    }
}
