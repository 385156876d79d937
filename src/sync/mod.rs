//! Shared-state synchronization between two independently-acting sessions.
//!
//! A broadcast bus fans row-change events out to the read cache and every
//! connected UI socket. Local writes publish directly; the Postgres LISTEN
//! bridge (`listener`) feeds in changes made elsewhere - the other
//! reader's session included.

pub mod cache;
pub mod listener;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tables the cache watches for row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedTable {
    Books,
    Progress,
    Notes,
}

/// An opaque invalidation trigger: something changed in `table`, refetch on
/// next access. No payload beyond the notes' owning book id - the strategy
/// is invalidate-then-refetch, not incremental patching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: WatchedTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
}

impl ChangeEvent {
    pub fn books() -> Self {
        ChangeEvent {
            table: WatchedTable::Books,
            book_id: None,
        }
    }

    pub fn progress() -> Self {
        ChangeEvent {
            table: WatchedTable::Progress,
            book_id: None,
        }
    }

    pub fn notes(book_id: impl Into<String>) -> Self {
        ChangeEvent {
            table: WatchedTable::Notes,
            book_id: Some(book_id.into()),
        }
    }

    pub fn all_notes() -> Self {
        ChangeEvent {
            table: WatchedTable::Notes,
            book_id: None,
        }
    }
}

/// Fan-out bus for change events.
#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Nobody listening is fine; events are triggers, not state.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
