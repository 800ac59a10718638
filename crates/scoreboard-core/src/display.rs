// View-models for the audience and operator displays.

use crate::player::Player;
use crate::visibility::Settings;

/// Who is looking at the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Read-only display: inputs masked and winner hidden in secret mode.
    Public,
    /// The person running the game: raw inputs, winner always shown.
    Operator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub avatar: Option<String>,
    pub money: String,
    pub input: Option<String>,
    pub is_team: bool,
    pub is_winner: bool,
}

/// Rows for `players` in the order given.
pub fn display_rows(players: &[Player], settings: &Settings, audience: Audience) -> Vec<DisplayRow> {
    let winner = match audience {
        Audience::Public => settings.visible_winner(),
        Audience::Operator => settings.winning_player_id.as_deref(),
    };

    players
        .iter()
        .map(|p| {
            let name = p.display_name();
            let input = match audience {
                Audience::Public => settings.masked_input(p.player_input.as_deref()),
                Audience::Operator => p.player_input.clone(),
            };
            DisplayRow {
                id: p.id.clone(),
                initials: initials(&name),
                name,
                avatar: p.avatar().map(str::to_owned),
                money: format_money(p.money_earned),
                input,
                is_team: p.is_team(),
                is_winner: winner == Some(p.id.as_str()),
            }
        })
        .collect()
}

/// `$1,234.5`: dollar sign, thousands separators, one decimal.
pub fn format_money(amount: f64) -> String {
    let fixed = format!("{:.1}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "0"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && fixed != "0.0" { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

/// Avatar fallback: first letters of the first two words, upper-cased.
/// Words that do not start with a letter or digit (such as `&`) are skipped.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_alphanumeric())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
