use serde::{Deserialize, Serialize};

use crate::types::bookmark::Bookmark;
use crate::types::errors::QueryError;
use crate::types::identity::AuthEvent;

/// Kind of change carried by one live-feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One incremental change to the owner's bookmark set, delivered over the
/// live feed in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: Bookmark,
}

impl ChangeEvent {
    pub fn insert(record: Bookmark) -> Self {
        Self { kind: ChangeKind::Insert, record }
    }

    pub fn update(record: Bookmark) -> Self {
        Self { kind: ChangeKind::Update, record }
    }

    pub fn delete(record: Bookmark) -> Self {
        Self { kind: ChangeKind::Delete, record }
    }
}

/// Message consumed by the app loop.
///
/// `Snapshot` and `Change` carry the sync epoch they were produced under;
/// the app discards any message whose epoch is no longer current, which is
/// how results for a superseded identity are suppressed.
#[derive(Debug)]
pub enum AppEvent {
    Auth(AuthEvent),
    Snapshot {
        epoch: u64,
        result: Result<Vec<Bookmark>, QueryError>,
    },
    Change {
        epoch: u64,
        event: ChangeEvent,
    },
}
