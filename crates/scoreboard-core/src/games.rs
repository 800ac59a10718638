// Game resolution over players' free-text inputs.
//
// Two games:
// - token draw: each positive whole number is a count of tokens in a bowl;
//   one token is drawn uniformly, so odds are proportional to the count.
// - lowest unique bid: the smallest number nobody else entered wins.
//
// Everything here is a free function over a roster slice. The only source of
// chance is the random draw, which callers pass in.

use std::collections::HashMap;

use rand::Rng;

use crate::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    TokenDraw,
    LowestUniqueBid,
}

impl GameKind {
    pub fn label(self) -> &'static str {
        match self {
            GameKind::TokenDraw => "Token Game",
            GameKind::LowestUniqueBid => "Unique Bid Game",
        }
    }
}

/// Run `kind` over `players` and return the winning id, if any.
pub fn resolve<R: Rng + ?Sized>(kind: GameKind, players: &[Player], rng: &mut R) -> Option<String> {
    match kind {
        GameKind::TokenDraw => weighted_lottery(players, rng),
        GameKind::LowestUniqueBid => lowest_unique_bid(players),
    }
}

/// Read the leading integer of `input`.
///
/// Surrounding whitespace is ignored, an optional sign is honored, and
/// anything after the digits is dropped: `"12 tokens"` is 12, `"3.9"` is 3.
/// Returns `None` when there are no leading digits or the value does not
/// fit in an `i64`.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Players taking part in a token draw, in roster order, with their token
/// counts. Blank, unparseable, zero and negative entries sit out.
pub fn lottery_entries(players: &[Player]) -> Vec<(&str, u64)> {
    players
        .iter()
        .filter_map(|p| {
            let weight = parse_leading_int(p.input()?)?;
            (weight > 0).then_some((p.id.as_str(), weight as u64))
        })
        .collect()
}

/// Draw a token-game winner using `rng`.
pub fn weighted_lottery<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Option<String> {
    let unit: f64 = rng.gen();
    weighted_lottery_at(players, unit)
}

/// Token-game winner for a fixed draw.
///
/// `unit` is a sample from [0, 1); it is scaled by the total token count and
/// the entries are walked in roster order until the running total reaches
/// the scaled draw.
pub fn weighted_lottery_at(players: &[Player], unit: f64) -> Option<String> {
    let entries = lottery_entries(players);
    let total = entries
        .iter()
        .fold(0u64, |sum, (_, weight)| sum.saturating_add(*weight));
    if total == 0 {
        return None;
    }

    let draw = unit * total as f64;
    let mut accumulated = 0u64;
    for (id, weight) in entries {
        accumulated = accumulated.saturating_add(weight);
        if draw <= accumulated as f64 {
            return Some(id.to_string());
        }
    }
    None
}

/// Each token-game participant's chance of winning, in roster order.
pub fn lottery_odds(players: &[Player]) -> Vec<(String, f64)> {
    let entries = lottery_entries(players);
    let total: f64 = entries.iter().map(|(_, w)| *w as f64).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    entries
        .into_iter()
        .map(|(id, weight)| (id.to_string(), weight as f64 / total))
        .collect()
}

/// Lowest-unique-bid winner: among bids entered by exactly one player, the
/// player with the smallest bid. Zero and negative bids count.
pub fn lowest_unique_bid(players: &[Player]) -> Option<String> {
    let bids: Vec<(&str, i64)> = players
        .iter()
        .filter_map(|p| Some((p.id.as_str(), parse_leading_int(p.input()?)?)))
        .collect();

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for (_, bid) in &bids {
        *counts.entry(*bid).or_insert(0) += 1;
    }

    bids.iter()
        .filter(|(_, bid)| counts.get(bid) == Some(&1))
        .min_by_key(|(_, bid)| *bid)
        .map(|(id, _)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn with_inputs(inputs: &[(&str, &str)]) -> Vec<Player> {
        inputs
            .iter()
            .map(|(id, input)| {
                let mut p = Player::single(*id, id.to_uppercase(), 0.0);
                p.player_input = Some(input.to_string());
                p
            })
            .collect()
    }

    #[test]
    fn parse_leading_int_handles_prefixes_and_signs() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7  "), Some(7));
        assert_eq!(parse_leading_int("12abc"), Some(12));
        assert_eq!(parse_leading_int("3.9"), Some(3));
        assert_eq!(parse_leading_int("-5"), Some(-5));
        assert_eq!(parse_leading_int("+8"), Some(8));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("99999999999999999999"), None);
    }

    #[test]
    fn lottery_skips_invalid_and_non_positive_entries() {
        let players = with_inputs(&[("a", "10"), ("b", "30"), ("c", "not a number"), ("d", "-5"), ("e", "0")]);
        let entries = lottery_entries(&players);
        assert_eq!(entries, vec![("a", 10), ("b", 30)]);
    }

    #[test]
    fn lottery_draw_at_35_of_40_picks_b() {
        let players = with_inputs(&[("a", "10"), ("b", "30"), ("c", "not a number"), ("d", "-5")]);
        assert_eq!(weighted_lottery_at(&players, 0.875).as_deref(), Some("b"));
        assert_eq!(weighted_lottery_at(&players, 0.8333).as_deref(), Some("b"));
    }

    #[test]
    fn lottery_boundary_belongs_to_earlier_entry() {
        let players = with_inputs(&[("a", "10"), ("b", "30")]);
        // 0.25 * 40 = 10, exactly a's cumulative weight
        assert_eq!(weighted_lottery_at(&players, 0.25).as_deref(), Some("a"));
        assert_eq!(weighted_lottery_at(&players, 0.0).as_deref(), Some("a"));
        assert_eq!(weighted_lottery_at(&players, 0.2501).as_deref(), Some("b"));
    }

    #[test]
    fn lottery_walks_roster_order_not_weight_order() {
        let players = with_inputs(&[("big", "90"), ("small", "10")]);
        assert_eq!(weighted_lottery_at(&players, 0.5).as_deref(), Some("big"));
        assert_eq!(weighted_lottery_at(&players, 0.95).as_deref(), Some("small"));
    }

    #[test]
    fn lottery_without_participants_has_no_winner() {
        let players = with_inputs(&[("a", ""), ("b", "zero"), ("c", "-1")]);
        assert_eq!(weighted_lottery_at(&players, 0.5), None);
        assert_eq!(weighted_lottery_at(&[], 0.5), None);
    }

    #[test]
    fn seeded_lottery_is_deterministic_and_roughly_proportional() {
        let players = with_inputs(&[("a", "10"), ("b", "30")]);

        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);
        assert_eq!(
            weighted_lottery(&players, &mut first),
            weighted_lottery(&players, &mut second)
        );

        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 4000;
        let b_wins = (0..draws)
            .filter(|_| weighted_lottery(&players, &mut rng).as_deref() == Some("b"))
            .count();
        let share = b_wins as f64 / draws as f64;
        assert!((share - 0.75).abs() < 0.05, "b won {share:.3} of draws");
    }

    #[test]
    fn odds_are_proportional_to_tokens() {
        let players = with_inputs(&[("a", "1"), ("b", "3"), ("c", "x")]);
        let odds = lottery_odds(&players);
        assert_eq!(odds.len(), 2);
        assert_eq!(odds[0].0, "a");
        assert!((odds[0].1 - 0.25).abs() < 1e-9);
        assert!((odds[1].1 - 0.75).abs() < 1e-9);
        assert!(lottery_odds(&with_inputs(&[("a", "0")])).is_empty());
    }

    #[test]
    fn unique_bid_picks_only_unique_value() {
        let players = with_inputs(&[("a", "7"), ("b", "7"), ("c", "3"), ("d", "3"), ("e", "9")]);
        assert_eq!(lowest_unique_bid(&players).as_deref(), Some("e"));
    }

    #[test]
    fn unique_bid_picks_lowest_of_several_unique() {
        let players = with_inputs(&[("a", "5"), ("b", "2"), ("c", "2"), ("d", "4"), ("e", "11")]);
        assert_eq!(lowest_unique_bid(&players).as_deref(), Some("d"));
    }

    #[test]
    fn unique_bid_allows_zero_and_negative() {
        let players = with_inputs(&[("a", "0"), ("b", "-3"), ("c", "1")]);
        assert_eq!(lowest_unique_bid(&players).as_deref(), Some("b"));
    }

    #[test]
    fn unique_bid_all_duplicates_has_no_winner() {
        let players = with_inputs(&[("a", "4"), ("b", "4"), ("c", "6"), ("d", "6")]);
        assert_eq!(lowest_unique_bid(&players), None);
    }

    #[test]
    fn unique_bid_ignores_blank_and_garbage() {
        let players = with_inputs(&[("a", "  "), ("b", "lots"), ("c", "8 please")]);
        assert_eq!(lowest_unique_bid(&players).as_deref(), Some("c"));
        assert_eq!(lowest_unique_bid(&with_inputs(&[("a", "")])), None);
    }

    #[test]
    fn resolve_dispatches_by_kind() {
        let players = with_inputs(&[("a", "2"), ("b", "2"), ("c", "5")]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            resolve(GameKind::LowestUniqueBid, &players, &mut rng).as_deref(),
            Some("c")
        );
        assert!(resolve(GameKind::TokenDraw, &players, &mut rng).is_some());
    }
}
