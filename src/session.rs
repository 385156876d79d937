//! Ephemeral per-session view state.
//!
//! Who is browsing, which book is open, which view and dialogs are active.
//! Lives in a watch channel so other parts of the core can observe it;
//! torn down with the process, never persisted. Selection changes also
//! scope the notes watch in the cache: only the currently open book's
//! notes stay cached.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::Participant;
use crate::sync::cache::LibraryCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    Library,
    Wishlist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub active_participant: Participant,
    pub selected_book_id: Option<String>,
    pub active_view: ActiveView,
    pub add_book_open: bool,
    pub add_note_open: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            active_participant: Participant::August,
            selected_book_id: None,
            active_view: ActiveView::Library,
            add_book_open: false,
            add_note_open: false,
        }
    }
}

/// Partial update; absent fields keep their value. `selected_book_id`
/// distinguishes absent (keep) from explicit null (deselect).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionPatch {
    pub active_participant: Option<Participant>,
    #[serde(deserialize_with = "present_field")]
    pub selected_book_id: Option<Option<String>>,
    pub active_view: Option<ActiveView>,
    pub add_book_open: Option<bool>,
    pub add_note_open: Option<bool>,
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

pub struct SessionStore {
    tx: watch::Sender<SessionState>,
    cache: Arc<LibraryCache>,
}

impl SessionStore {
    pub fn new(cache: Arc<LibraryCache>) -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx, cache }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply a partial update. Changing the selection releases the old
    /// book's notes watch on every path, including deselection.
    pub fn apply(&self, patch: SessionPatch) -> SessionState {
        self.tx.send_modify(|state| {
            if let Some(participant) = patch.active_participant {
                state.active_participant = participant;
            }
            if let Some(view) = patch.active_view {
                state.active_view = view;
            }
            if let Some(open) = patch.add_book_open {
                state.add_book_open = open;
            }
            if let Some(open) = patch.add_note_open {
                state.add_note_open = open;
            }
            if let Some(selection) = patch.selected_book_id
                && state.selected_book_id != selection
            {
                if let Some(old) = state.selected_book_id.take() {
                    self.cache.release_notes(&old);
                }
                state.selected_book_id = selection;
            }
        });
        self.current()
    }

    pub fn select_book(&self, selection: Option<String>) -> SessionState {
        self.apply(SessionPatch {
            selected_book_id: Some(selection),
            ..Default::default()
        })
    }
}
