// Shared display settings: secret mode, the announced winner, and the game
// image. Every change is persisted and then pushed to subscribed listeners.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::Database;

/// Storage key of the settings blob.
pub const SETTINGS_KEY: &str = "scoreboard-settings";

/// What the audience sees in place of a non-empty input while secret mode is on.
pub const MASK_TOKEN: &str = "*****";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub secret_mode: bool,
    pub winning_player_id: Option<String>,
    pub selected_image_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            secret_mode: true,
            winning_player_id: None,
            selected_image_path: None,
        }
    }
}

impl Settings {
    /// How a player's input reads on the public display.
    pub fn masked_input(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        if self.secret_mode && !raw.trim().is_empty() {
            Some(MASK_TOKEN.to_string())
        } else {
            Some(raw.to_string())
        }
    }

    /// The winner the audience may see. Hidden while secret mode is on.
    pub fn visible_winner(&self) -> Option<&str> {
        if self.secret_mode {
            None
        } else {
            self.winning_player_id.as_deref()
        }
    }
}

/// Handle returned by [`VisibilityCoordinator::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&Settings) + Send + Sync>;

pub struct VisibilityCoordinator {
    db: Arc<Database>,
    settings: Settings,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl VisibilityCoordinator {
    /// Read the persisted settings. Absent or unreadable settings are replaced
    /// by the defaults, which are written back immediately.
    pub fn load(db: Arc<Database>) -> Result<Self> {
        let settings = read_or_reset(&db)?;
        info!(
            "Loaded display settings (secret mode {})",
            if settings.secret_mode { "on" } else { "off" }
        );
        Ok(VisibilityCoordinator {
            db,
            settings,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn toggle_secret(&mut self) -> Result<()> {
        let next = !self.settings.secret_mode;
        self.set_secret(next)
    }

    pub fn set_secret(&mut self, secret: bool) -> Result<()> {
        self.apply(|s| s.secret_mode = secret)?;
        info!("Secret mode {}", if secret { "on" } else { "off" });
        Ok(())
    }

    /// Announce `id` as the winner of the last game.
    pub fn record_winner(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        info!("Recorded winner {id}");
        self.apply(|s| s.winning_player_id = Some(id))
    }

    pub fn clear_winner(&mut self) -> Result<()> {
        self.apply(|s| s.winning_player_id = None)
    }

    /// Choose the game image. An empty path clears the selection.
    pub fn select_image(&mut self, path: Option<String>) -> Result<()> {
        let path = path.filter(|p| !p.trim().is_empty());
        self.apply(|s| s.selected_image_path = path)
    }

    /// Register `listener` to run after every settings change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&Settings) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Re-read the settings after another process changed them. Listeners run
    /// only when the stored value differs from the one held here.
    pub fn refresh(&mut self) -> Result<bool> {
        let stored = read_or_reset(&self.db)?;
        if stored == self.settings {
            return Ok(false);
        }
        self.settings = stored;
        self.notify();
        Ok(true)
    }

    /// Persist the changed settings, then adopt and announce them. A failed
    /// write leaves the in-memory settings as they were.
    fn apply(&mut self, change: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut next = self.settings.clone();
        change(&mut next);
        write(&self.db, &next)?;
        self.settings = next;
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.settings);
        }
    }
}

fn write(db: &Database, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string(settings).context("failed to serialize settings")?;
    db.put(SETTINGS_KEY, &json)
}

fn read_or_reset(db: &Database) -> Result<Settings> {
    match db.get(SETTINGS_KEY)? {
        Some(raw) => match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Stored settings are corrupt ({e}); resetting to defaults");
                let settings = Settings::default();
                write(db, &settings)?;
                Ok(settings)
            }
        },
        None => {
            let settings = Settings::default();
            write(db, &settings)?;
            Ok(settings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn coordinator() -> (Arc<Database>, VisibilityCoordinator) {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let coord = VisibilityCoordinator::load(Arc::clone(&db)).unwrap();
        (db, coord)
    }

    #[test]
    fn defaults_to_secret_and_persists_defaults() {
        let (db, coord) = coordinator();
        assert!(coord.settings().secret_mode);
        assert_eq!(coord.settings().winning_player_id, None);

        let raw = db.get(SETTINGS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["secretMode"], true);
        assert!(value["winningPlayerId"].is_null());
    }

    #[test]
    fn corrupt_settings_are_reset_and_rewritten() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.put(SETTINGS_KEY, "{not json").unwrap();

        let coord = VisibilityCoordinator::load(Arc::clone(&db)).unwrap();
        assert_eq!(coord.settings(), &Settings::default());

        let raw = db.get(SETTINGS_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<Settings>(&raw).is_ok());
    }

    #[test]
    fn partial_settings_fill_missing_fields() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.put(SETTINGS_KEY, r#"{"winningPlayerId":"p2"}"#).unwrap();
        let coord = VisibilityCoordinator::load(db).unwrap();
        assert!(coord.settings().secret_mode);
        assert_eq!(coord.settings().winning_player_id.as_deref(), Some("p2"));
    }

    #[test]
    fn mutations_persist() {
        let (db, mut coord) = coordinator();
        coord.toggle_secret().unwrap();
        coord.record_winner("p7").unwrap();
        coord.select_image(Some("/game_images/bowl.png".into())).unwrap();

        let reopened = VisibilityCoordinator::load(db).unwrap();
        let s = reopened.settings();
        assert!(!s.secret_mode);
        assert_eq!(s.winning_player_id.as_deref(), Some("p7"));
        assert_eq!(s.selected_image_path.as_deref(), Some("/game_images/bowl.png"));
    }

    #[test]
    fn empty_image_path_clears_selection() {
        let (_db, mut coord) = coordinator();
        coord.select_image(Some("a.png".into())).unwrap();
        coord.select_image(Some("".into())).unwrap();
        assert_eq!(coord.settings().selected_image_path, None);
    }

    #[test]
    fn listeners_see_every_change_until_unsubscribed() {
        let (_db, mut coord) = coordinator();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = coord.subscribe(move |s| sink.lock().unwrap().push(s.secret_mode));

        coord.toggle_secret().unwrap();
        coord.toggle_secret().unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);

        assert!(coord.unsubscribe(id));
        assert!(!coord.unsubscribe(id));
        coord.toggle_secret().unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn refresh_fires_only_on_external_change() {
        let (db, mut coord) = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        coord.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!coord.refresh().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut other = VisibilityCoordinator::load(Arc::clone(&db)).unwrap();
        other.record_winner("p3").unwrap();

        assert!(coord.refresh().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coord.settings().winning_player_id.as_deref(), Some("p3"));
    }

    #[test]
    fn failed_write_keeps_settings_and_skips_listeners() {
        let (db, mut coord) = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        coord.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        db.execute_batch(
            "CREATE TRIGGER reject_writes BEFORE UPDATE ON kv_store
             BEGIN SELECT RAISE(ABORT, 'read only'); END;",
        )
        .unwrap();

        assert!(coord.toggle_secret().is_err());
        assert!(coord.record_winner("p1").is_err());
        assert!(coord.settings().secret_mode);
        assert_eq!(coord.settings().winning_player_id, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let stored: Settings = serde_json::from_str(&db.get(SETTINGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(&stored, coord.settings());
    }

    #[test]
    fn masking_depends_on_secret_mode() {
        let mut s = Settings::default();
        assert_eq!(s.masked_input(Some("42")).as_deref(), Some(MASK_TOKEN));
        assert_eq!(s.masked_input(Some("   ")).as_deref(), Some("   "));
        assert_eq!(s.masked_input(None), None);

        s.secret_mode = false;
        assert_eq!(s.masked_input(Some("42")).as_deref(), Some("42"));
    }

    #[test]
    fn winner_visible_only_when_public() {
        let mut s = Settings {
            winning_player_id: Some("w".into()),
            ..Settings::default()
        };
        assert_eq!(s.visible_winner(), None);
        s.secret_mode = false;
        assert_eq!(s.visible_winner(), Some("w"));
    }
}
