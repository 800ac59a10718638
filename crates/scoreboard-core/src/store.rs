// Roster store: the single owner of the player list.
//
// Every mutation goes through this type, which writes the full roster back to
// the database before returning. Callers never hold a mutable handle to the
// list itself.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::player::{parse_money, round_money, Player};
use crate::seed::SeedProvider;
use crate::team::{self, ComposeError};

/// Storage key of the roster blob.
pub const ROSTER_KEY: &str = "scoreboard-players";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct RosterStore {
    db: Arc<Database>,
    players: Vec<Player>,
}

impl RosterStore {
    /// Load the persisted roster, falling back to the seed provider when
    /// nothing usable is stored.
    ///
    /// A corrupt blob is discarded before the seed is read, so a failed seed
    /// fetch is retried on the next start instead of leaving garbage behind.
    /// A seed roster that was read successfully is persisted immediately.
    pub async fn load(db: Arc<Database>, seed: &dyn SeedProvider) -> Result<Self> {
        if let Some(raw) = db.get(ROSTER_KEY)? {
            match serde_json::from_str::<Vec<Player>>(&raw) {
                Ok(players) => {
                    let players = dedupe(players);
                    info!("Loaded {} players from storage", players.len());
                    return Ok(RosterStore { db, players });
                }
                Err(e) => {
                    warn!("Stored roster is corrupt ({e}); reloading from seed");
                    db.remove(ROSTER_KEY)?;
                }
            }
        }

        let mut store = RosterStore {
            db,
            players: Vec::new(),
        };
        match seed.players().await {
            Ok(players) => {
                store.save(dedupe(players))?;
                info!("Seeded roster with {} players", store.players.len());
            }
            Err(e) => {
                error!("Failed to load seed roster: {e}");
            }
        }
        Ok(store)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Replace the whole roster and persist it.
    pub fn save(&mut self, players: Vec<Player>) -> Result<()> {
        let json = serde_json::to_string(&players).context("failed to serialize roster")?;
        self.db.put(ROSTER_KEY, &json)?;
        self.players = players;
        Ok(())
    }

    /// Apply `mutator` to the player with `id` and persist the roster.
    ///
    /// Money is re-rounded to one decimal (and floored at zero) afterwards.
    /// The player keeps `id` whatever the mutator does to it. An unknown id
    /// leaves the roster untouched.
    pub fn update<F>(&mut self, id: &str, mutator: F) -> Result<&[Player]>
    where
        F: FnOnce(&mut Player),
    {
        let Some(index) = self.players.iter().position(|p| p.id == id) else {
            warn!("Ignoring update for unknown player {id}");
            return Ok(self.players.as_slice());
        };

        let mut next = self.players.clone();
        let player = &mut next[index];
        mutator(player);
        if player.id != id {
            warn!("Ignoring id change {id} -> {} in update", player.id);
            player.id = id.to_string();
        }
        player.money_earned = round_money(player.money_earned.max(0.0));
        self.save(next)?;
        Ok(self.players.as_slice())
    }

    /// Add `delta` to a player's money. A change that would take the total
    /// below zero is refused. Returns whether the roster changed.
    pub fn adjust_money(&mut self, id: &str, delta: f64) -> Result<bool> {
        let Some(current) = self.get(id).map(|p| p.money_earned) else {
            warn!("Ignoring money change for unknown player {id}");
            return Ok(false);
        };
        if current + delta < 0.0 {
            debug!("Refusing to take {id} below zero");
            return Ok(false);
        }
        self.update(id, |p| p.money_earned += delta)?;
        info!("Adjusted {id} by {delta:+.1}");
        Ok(true)
    }

    /// Set a player's money from operator-typed text. Unparseable text is
    /// ignored and reported as `Ok(false)`.
    pub fn set_money_text(&mut self, id: &str, text: &str) -> Result<bool> {
        if self.get(id).is_none() {
            warn!("Ignoring money edit for unknown player {id}");
            return Ok(false);
        }
        let amount = match parse_money(text) {
            Ok(amount) => amount,
            Err(e) => {
                debug!("Ignoring money edit for {id}: {e}");
                return Ok(false);
            }
        };
        self.update(id, |p| p.money_earned = amount)?;
        info!("Set {id} to ${amount:.1}");
        Ok(true)
    }

    /// Record a player's game input. Empty text clears it.
    pub fn set_input(&mut self, id: &str, text: &str) -> Result<bool> {
        if self.get(id).is_none() {
            warn!("Ignoring input for unknown player {id}");
            return Ok(false);
        }
        let input = (!text.is_empty()).then(|| text.to_string());
        self.update(id, |p| p.player_input = input)?;
        Ok(true)
    }

    /// Clear every player's game input for a new round.
    pub fn clear_inputs(&mut self) -> Result<()> {
        let next = self
            .players
            .iter()
            .cloned()
            .map(|mut p| {
                p.player_input = None;
                p
            })
            .collect();
        self.save(next)?;
        info!("Cleared all game inputs");
        Ok(())
    }

    /// Merge the selected players into a team and persist the new roster.
    pub fn merge(&mut self, ids: &[String]) -> Result<Player, StoreError> {
        let (next, team) = team::merge(&self.players, ids)?;
        self.save(next)?;
        Ok(team)
    }

    /// Split a team back into singles and persist the new roster.
    pub fn split(&mut self, team_id: &str) -> Result<Vec<Player>, StoreError> {
        let stamp = Utc::now().timestamp_millis();
        let (next, singles) = team::split(&self.players, team_id, stamp)?;
        self.save(next)?;
        Ok(singles)
    }

    /// Re-read the stored roster after another process wrote it. Returns
    /// `true` if the in-memory roster changed. A missing or corrupt blob is
    /// left for the next local write to replace.
    pub fn reload(&mut self) -> Result<bool> {
        let Some(raw) = self.db.get(ROSTER_KEY)? else {
            return Ok(false);
        };
        let players = match serde_json::from_str::<Vec<Player>>(&raw) {
            Ok(players) => dedupe(players),
            Err(e) => {
                warn!("Ignoring unreadable roster from storage: {e}");
                return Ok(false);
            }
        };
        if players == self.players {
            return Ok(false);
        }
        info!("Roster changed in storage ({} players)", players.len());
        self.players = players;
        Ok(true)
    }
}

/// Drop entries whose id was already seen, keeping the first.
fn dedupe(players: Vec<Player>) -> Vec<Player> {
    let mut seen = HashSet::new();
    let before = players.len();
    let unique: Vec<Player> = players
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    if unique.len() != before {
        warn!("Dropped {} players with duplicate ids", before - unique.len());
    }
    unique
}
