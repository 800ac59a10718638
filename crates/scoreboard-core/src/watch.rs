// Storage change watcher.
//
// Other scoreboard processes may share the database file. This task polls the
// revision counters of the roster and settings keys and reports which blob
// moved, so the owner of the in-memory copies can re-read them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::db::Database;
use crate::store::ROSTER_KEY;
use crate::visibility::SETTINGS_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChange {
    Roster,
    Settings,
}

impl StorageChange {
    fn key(self) -> &'static str {
        match self {
            StorageChange::Roster => ROSTER_KEY,
            StorageChange::Settings => SETTINGS_KEY,
        }
    }
}

pub struct StorageWatcher {
    db: Arc<Database>,
    interval: Duration,
    tx: mpsc::Sender<StorageChange>,
    seen: [(StorageChange, u64); 2],
}

impl StorageWatcher {
    /// Start from the revisions stored right now; only later writes are
    /// reported.
    pub fn new(db: Arc<Database>, interval: Duration, tx: mpsc::Sender<StorageChange>) -> Self {
        let mut seen = [(StorageChange::Roster, 0), (StorageChange::Settings, 0)];
        for (change, revision) in &mut seen {
            *revision = db.revision(change.key()).unwrap_or(0);
        }
        StorageWatcher {
            db,
            interval,
            tx,
            seen,
        }
    }

    /// Check both keys once and return the ones whose revision moved.
    pub fn poll(&mut self) -> Vec<StorageChange> {
        let mut changed = Vec::new();
        for (change, last) in &mut self.seen {
            match self.db.revision(change.key()) {
                Ok(revision) if revision != *last => {
                    debug!("{:?} revision {} -> {}", change, last, revision);
                    *last = revision;
                    changed.push(*change);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read revision of {}: {e:#}", change.key()),
            }
        }
        changed
    }

    /// Poll until the receiver goes away.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for change in self.poll() {
                if self.tx.send(change).await.is_err() {
                    debug!("Storage watcher stopping: receiver closed");
                    return;
                }
            }
        }
    }
}
