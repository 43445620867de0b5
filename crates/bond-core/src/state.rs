//! Bond state and its shared, lock-guarded handle

use crate::emotion::EmotionLabel;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// The persisted aggregate.
///
/// Missing top-level keys fall back to their defaults when decoding, and
/// keys this version does not know about are kept in `extra` so they
/// survive a load/save round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondDocument {
    #[serde(default)]
    pub bond: BondRecord,
    #[serde(default = "default_self_version")]
    pub self_version: u64,
    #[serde(default)]
    pub updates: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Relationship record between the agent and its user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    #[serde(default = "default_loyalty")]
    pub loyalty: f64,
    #[serde(default)]
    pub emotional_state: EmotionLabel,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recorded turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Seconds since the Unix epoch
    pub time: f64,
    pub message: String,
    pub emotion: EmotionLabel,
}

fn default_self_version() -> u64 {
    1
}

fn default_loyalty() -> f64 {
    1.0
}

impl Default for BondDocument {
    fn default() -> Self {
        Self {
            bond: BondRecord::default(),
            self_version: default_self_version(),
            updates: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Default for BondRecord {
    fn default() -> Self {
        Self {
            loyalty: default_loyalty(),
            emotional_state: EmotionLabel::Neutral,
            history: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl BondDocument {
    /// Whether the update log matches the version counter
    pub fn is_consistent(&self) -> bool {
        self.updates.len() as u64 + 1 == self.self_version
    }
}

fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Shared handle to the single in-memory bond.
///
/// Every operation holds the lock for its whole duration, so a snapshot
/// never observes a half-applied mutation.
#[derive(Debug, Clone, Default)]
pub struct Bond {
    inner: Arc<Mutex<BondDocument>>,
}

impl Bond {
    pub fn new(document: BondDocument) -> Self {
        Self {
            inner: Arc::new(Mutex::new(document)),
        }
    }

    /// Set the emotional state and append a history entry.
    ///
    /// Returns the new history length.
    pub fn record_turn(&self, label: EmotionLabel, message: impl Into<String>) -> usize {
        let entry = HistoryEntry {
            time: unix_now(),
            message: message.into(),
            emotion: label,
        };

        let mut doc = self.inner.lock();
        doc.bond.emotional_state = label;
        doc.bond.history.push(entry);

        debug!(emotion = %label, history = doc.bond.history.len(), "Recorded turn");
        doc.bond.history.len()
    }

    /// Bump the self-version and log the update. Returns the new version.
    pub fn tick(&self) -> u64 {
        let mut doc = self.inner.lock();
        doc.self_version += 1;
        let version = doc.self_version;
        doc.updates.push(format!("Auto-update version {}", version));

        info!(version, "Self-updated to version {}", version);
        version
    }

    /// Immutable copy of the current state
    pub fn snapshot(&self) -> BondDocument {
        self.inner.lock().clone()
    }

    pub fn emotional_state(&self) -> EmotionLabel {
        self.inner.lock().bond.emotional_state
    }

    pub fn self_version(&self) -> u64 {
        self.inner.lock().self_version
    }

    pub fn loyalty(&self) -> f64 {
        self.inner.lock().bond.loyalty
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().bond.history.len()
    }
}
