//! Records as stored and rendered, plus the whitelisted change sets that mutate them.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Miner {
    pub id: i64,
    pub name: Option<String>,
    pub level: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RareGem {
    pub id: i64,
    pub name: Option<String>,
    pub color: Option<String>,
    pub miner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A miner rendered with its gems embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinerWithGems {
    #[serde(flatten)]
    pub miner: Miner,
    pub rare_gems: Vec<RareGem>,
}

/// Per field: `None` leaves the column untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinerChanges {
    pub name: Option<Option<String>>,
    pub level: Option<Option<i32>>,
}

/// `miner_id` is never cleared; the column is NOT NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RareGemChanges {
    pub name: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub miner_id: Option<i64>,
}

impl Miner {
    pub fn location(&self) -> String {
        format!("/miners/{}", self.id)
    }

    pub(crate) fn apply(&mut self, changes: &MinerChanges, now: DateTime<Utc>) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(level) = changes.level {
            self.level = level;
        }
        self.updated_at = now;
    }
}

impl RareGem {
    pub fn location(&self) -> String {
        format!("/rare_gems/{}", self.id)
    }

    pub(crate) fn apply(&mut self, changes: &RareGemChanges, now: DateTime<Utc>) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(color) = &changes.color {
            self.color = color.clone();
        }
        if let Some(miner_id) = changes.miner_id {
            self.miner_id = miner_id;
        }
        self.updated_at = now;
    }
}
