// Player records: singles and teams as stored in the roster blob.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a roster entry is one contestant or a merged group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Single,
    Team,
}

/// A roster entry. Field names on the wire match the seed roster format
/// (`moneyEarned`, `avatarUrl`, ...). A `rank` field in incoming JSON is
/// ignored: rank is derived by the leaderboard, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PlayerKind,
    /// One name for a single, two or more for a team, in formation order.
    pub names: Vec<String>,
    #[serde(default)]
    pub money_earned: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_avatar_url: Option<String>,
    /// Free text typed during a game round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_input: Option<String>,
}

impl Player {
    pub fn single(id: impl Into<String>, name: impl Into<String>, money_earned: f64) -> Self {
        Player {
            id: id.into(),
            kind: PlayerKind::Single,
            names: vec![name.into()],
            money_earned,
            avatar_url: None,
            team_avatar_url: None,
            player_input: None,
        }
    }

    pub fn team(
        id: impl Into<String>,
        names: Vec<String>,
        money_earned: f64,
        team_avatar_url: Option<String>,
    ) -> Self {
        Player {
            id: id.into(),
            kind: PlayerKind::Team,
            names,
            money_earned,
            avatar_url: None,
            team_avatar_url,
            player_input: None,
        }
    }

    pub fn is_team(&self) -> bool {
        self.kind == PlayerKind::Team
    }

    /// Names joined the way the cards show them: `"Ann & Bob"`.
    pub fn display_name(&self) -> String {
        self.names.join(" & ")
    }

    /// The avatar that applies to this entry's kind, ignoring empty strings.
    pub fn avatar(&self) -> Option<&str> {
        let url = match self.kind {
            PlayerKind::Single => self.avatar_url.as_deref(),
            PlayerKind::Team => self.team_avatar_url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }

    /// Trimmed game input, or `None` when absent or blank.
    pub fn input(&self) -> Option<&str> {
        self.player_input
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Round an amount to one decimal place.
pub fn round_money(amount: f64) -> f64 {
    (amount * 10.0).round() / 10.0
}

/// Free-text money edit that did not produce a usable amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid amount: {input:?}")]
pub struct InvalidNumericInput {
    pub input: String,
}

/// Parse an operator-typed amount.
///
/// `$` and `,` are dropped, then the longest leading decimal number is read
/// (optional sign, digits, fraction, exponent) and anything after it is
/// ignored, so `"$1,250.5"` reads as 1250.5 and `"12abc"` as 12. The result
/// is rounded to one decimal place. Input with no leading number, or a
/// negative amount, is rejected.
pub fn parse_money(text: &str) -> Result<f64, InvalidNumericInput> {
    let invalid = || InvalidNumericInput {
        input: text.to_string(),
    };

    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let prefix = leading_number(&cleaned).ok_or_else(invalid)?;
    let value: f64 = prefix.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    // abs() folds -0 into 0
    Ok(round_money(value.abs()))
}

/// The longest prefix of `text` shaped like `[+-]digits[.digits][e[+-]digits]`
/// with at least one mantissa digit.
fn leading_number(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    Some(&text[..end])
}
