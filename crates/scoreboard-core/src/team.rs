// Team formation: merge singles into a team and break a team back apart.
//
// Both operations are pure: they take the current roster and return a new
// one, leaving persistence to the roster store.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tracing::info;

use crate::player::{round_money, Player, PlayerKind};

/// Why a merge or split was refused. The roster is never modified when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("a team needs at least two players, got {0}")]
    TooFewPlayers(usize),

    #[error("no player with id `{0}`")]
    UnknownPlayer(String),

    #[error("`{0}` is already a team; break it up before forming a new one")]
    AlreadyATeam(String),

    #[error("a team with these players already exists: {0}")]
    DuplicateTeam(String),

    #[error("`{0}` is not a team")]
    NotATeam(String),
}

impl ComposeError {
    /// True for the two conflicts an operator can resolve by changing the
    /// selection (as opposed to a stale or malformed request).
    pub fn is_merge_conflict(&self) -> bool {
        matches!(
            self,
            ComposeError::AlreadyATeam(_) | ComposeError::DuplicateTeam(_)
        )
    }
}

/// Merge the players named by `selected` into one team.
///
/// The team's names are the members' names in selection order, its money is
/// the members' total, and its avatar is the first member avatar found. The
/// members leave the roster and the team is appended; everyone else keeps
/// their place.
pub fn merge(roster: &[Player], selected: &[String]) -> Result<(Vec<Player>, Player), ComposeError> {
    let mut seen = HashSet::new();
    let ids: Vec<&str> = selected
        .iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect();

    if ids.len() < 2 {
        return Err(ComposeError::TooFewPlayers(ids.len()));
    }

    let members = ids
        .iter()
        .map(|id| {
            roster
                .iter()
                .find(|p| p.id == *id)
                .ok_or_else(|| ComposeError::UnknownPlayer(id.to_string()))
        })
        .collect::<Result<Vec<&Player>, _>>()?;

    if let Some(team) = members.iter().find(|p| p.is_team()) {
        return Err(ComposeError::AlreadyATeam(team.id.clone()));
    }

    let names: Vec<String> = members.iter().flat_map(|p| p.names.iter().cloned()).collect();
    let wanted = name_set(&names);
    if let Some(existing) = roster
        .iter()
        .find(|p| p.is_team() && name_set(&p.names) == wanted)
    {
        return Err(ComposeError::DuplicateTeam(existing.display_name()));
    }

    let money = round_money(members.iter().map(|p| p.money_earned).sum());
    let avatar = members.iter().find_map(|p| p.avatar()).map(str::to_owned);
    let id = unique_id(format!("team-{}", ids.join("-")), |candidate| {
        roster.iter().any(|p| p.id == candidate)
    });

    let team = Player::team(id, names, money, avatar);

    let mut next: Vec<Player> = roster
        .iter()
        .filter(|p| !ids.contains(&p.id.as_str()))
        .cloned()
        .collect();
    next.push(team.clone());

    info!(
        "Formed team {} ({}) with ${:.1}",
        team.id,
        team.display_name(),
        team.money_earned
    );
    Ok((next, team))
}

/// Break the team `team_id` into one single per name.
///
/// Money is divided evenly and each share is rounded to one decimal on its
/// own, so the shares may not add back up to the team total exactly. Every
/// new single inherits the team avatar. `stamp` makes the new ids fresh
/// across repeated merge/split cycles; callers pass the current time.
pub fn split(
    roster: &[Player],
    team_id: &str,
    stamp: i64,
) -> Result<(Vec<Player>, Vec<Player>), ComposeError> {
    let team = roster
        .iter()
        .find(|p| p.id == team_id)
        .ok_or_else(|| ComposeError::UnknownPlayer(team_id.to_string()))?;

    if team.kind != PlayerKind::Team {
        return Err(ComposeError::NotATeam(team_id.to_string()));
    }

    let share = round_money(team.money_earned / team.names.len().max(1) as f64);

    let mut singles: Vec<Player> = Vec::with_capacity(team.names.len());
    for (i, name) in team.names.iter().enumerate() {
        let id = unique_id(format!("{}-{}-{}", team.id, i + 1, stamp), |candidate| {
            roster.iter().any(|p| p.id == candidate) || singles.iter().any(|s| s.id == candidate)
        });
        let mut single = Player::single(id, name.clone(), share);
        single.avatar_url = team.team_avatar_url.clone();
        singles.push(single);
    }

    let mut next: Vec<Player> = roster.iter().filter(|p| p.id != team_id).cloned().collect();
    next.extend(singles.iter().cloned());

    info!(
        "Split team {} into {} players at ${:.1} each",
        team.id,
        singles.len(),
        share
    );
    Ok((next, singles))
}

fn name_set(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(String::as_str).collect()
}

/// `base`, or `base-2`, `base-3`, ... whichever is first not `taken`.
fn unique_id(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
