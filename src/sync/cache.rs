//! Read cache with realtime invalidation and optimistic progress updates.
//!
//! The strategy is coarse invalidate-then-refetch: any change event marks
//! the affected entry stale and the next read refetches, one extra round
//! trip per change instead of incremental patching. Optimistic progress
//! edits patch the cached view first, snapshot in hand, and roll the view
//! back verbatim if the store rejects the write; either way a final
//! invalidation reconciles with ground truth. The optimistic value is a
//! prediction, never the system of record.

use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast};

use crate::models::book_view::percent_read;
use crate::models::{BookWithProgress, Participant, book, note};
use crate::services::book_service::{self, BookPatch, NewBook};
use crate::services::note_service::{self, NewNote};
use crate::services::progress_service::{self, ProgressUpdate};
use crate::services::ServiceError;

use super::{ChangeBus, ChangeEvent, WatchedTable};

#[derive(Default)]
struct BooksSlot {
    rows: Option<Vec<BookWithProgress>>,
    fresh: bool,
}

pub struct LibraryCache {
    db: DatabaseConnection,
    bus: ChangeBus,
    books: RwLock<BooksSlot>,
    /// Bumped before every optimistic patch to cancel in-flight refetches,
    /// so a response that predates the patch cannot overwrite it.
    generation: AtomicU64,
    notes: DashMap<String, Vec<note::Model>>,
}

impl LibraryCache {
    pub fn new(db: DatabaseConnection, bus: ChangeBus) -> Arc<Self> {
        Arc::new(Self {
            db,
            bus,
            books: RwLock::new(BooksSlot::default()),
            generation: AtomicU64::new(0),
            notes: DashMap::new(),
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The books view, refetched lazily after invalidation.
    pub async fn books(&self) -> Result<Vec<BookWithProgress>, ServiceError> {
        {
            let slot = self.books.read().await;
            if slot.fresh
                && let Some(rows) = &slot.rows
            {
                return Ok(rows.clone());
            }
        }

        loop {
            let generation = self.generation.load(Ordering::Acquire);
            let rows = book_service::list_books_with_progress(&self.db).await?;

            let mut slot = self.books.write().await;
            if self.generation.load(Ordering::Acquire) != generation {
                // Superseded by an optimistic write while the query was in
                // flight; this response is stale, fetch again.
                drop(slot);
                continue;
            }
            slot.rows = Some(rows.clone());
            slot.fresh = true;
            return Ok(rows);
        }
    }

    /// Current view without refetching. A stale value stays visible here
    /// until the next `books()` call reconciles.
    pub async fn peek_books(&self) -> Option<Vec<BookWithProgress>> {
        self.books.read().await.rows.clone()
    }

    pub async fn invalidate_books(&self) {
        self.books.write().await.fresh = false;
    }

    pub fn invalidate_notes(&self, book_id: Option<&str>) {
        match book_id {
            Some(id) => {
                self.notes.remove(id);
            }
            None => self.notes.clear(),
        }
    }

    /// Drop the notes watch for a book (deselected or deleted). Without an
    /// entry the book's notes are neither cached nor refetched.
    pub fn release_notes(&self, book_id: &str) {
        self.notes.remove(book_id);
    }

    pub async fn notes(&self, book_id: &str) -> Result<Vec<note::Model>, ServiceError> {
        if let Some(hit) = self.notes.get(book_id) {
            return Ok(hit.clone());
        }
        let rows = note_service::list_notes(&self.db, book_id).await?;
        self.notes.insert(book_id.to_owned(), rows.clone());
        Ok(rows)
    }

    pub async fn add_book(&self, new: NewBook) -> Result<book::Model, ServiceError> {
        let created = book_service::add_book(&self.db, new).await?;
        self.invalidate_books().await;
        self.bus.publish(ChangeEvent::books());
        self.bus.publish(ChangeEvent::progress());
        Ok(created)
    }

    pub async fn update_book(
        &self,
        id: &str,
        patch: BookPatch,
    ) -> Result<book::Model, ServiceError> {
        let updated = book_service::update_book(&self.db, id, patch).await?;
        self.invalidate_books().await;
        self.bus.publish(ChangeEvent::books());
        Ok(updated)
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), ServiceError> {
        book_service::delete_book(&self.db, id).await?;
        // Progress and notes go with the book via backend cascades.
        self.release_notes(id);
        self.invalidate_books().await;
        self.bus.publish(ChangeEvent::books());
        Ok(())
    }

    pub async fn add_note(&self, new: NewNote) -> Result<note::Model, ServiceError> {
        let created = note_service::add_note(&self.db, new).await?;
        self.invalidate_notes(Some(&created.book_id));
        self.bus.publish(ChangeEvent::notes(created.book_id.clone()));
        Ok(created)
    }

    /// Optimistic progress edit: patch the cached view, then run the real
    /// upsert. On failure the exact pre-patch view is restored - full
    /// rollback, no merging.
    pub async fn update_progress(
        &self,
        book_id: &str,
        reader: Participant,
        update: ProgressUpdate,
    ) -> Result<(), ServiceError> {
        // Reject bad input before predicting anything.
        update.validate()?;

        self.generation.fetch_add(1, Ordering::AcqRel);
        let snapshot = {
            let mut slot = self.books.write().await;
            let snapshot = slot.rows.clone();
            if let Some(rows) = slot.rows.as_mut()
                && let Some(row) = rows.iter_mut().find(|b| b.id == book_id)
            {
                apply_update(row, reader, &update);
            }
            snapshot
        };

        match progress_service::upsert_progress(&self.db, book_id, reader, update).await {
            Ok(()) => {
                self.invalidate_books().await;
                self.bus.publish(ChangeEvent::progress());
                Ok(())
            }
            Err(err) => {
                self.generation.fetch_add(1, Ordering::AcqRel);
                {
                    let mut slot = self.books.write().await;
                    slot.rows = snapshot;
                    slot.fresh = false;
                }
                self.bus.publish(ChangeEvent::progress());
                Err(err)
            }
        }
    }

    pub async fn apply_event(&self, event: &ChangeEvent) {
        match event.table {
            WatchedTable::Books | WatchedTable::Progress => self.invalidate_books().await,
            WatchedTable::Notes => self.invalidate_notes(event.book_id.as_deref()),
        }
    }

    /// Apply bus events until the bus closes. One task per cache, spawned
    /// at startup.
    pub fn spawn_invalidator(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut events = cache.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => cache.apply_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Invalidation stream lagged by {} events; dropping all cached reads",
                            skipped
                        );
                        cache.invalidate_books().await;
                        cache.invalidate_notes(None);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

fn apply_update(row: &mut BookWithProgress, reader: Participant, update: &ProgressUpdate) {
    let total_pages = row.total_pages;
    let progress = row.progress_for_mut(reader);
    progress.status = update.status;
    if let Some(page) = update.current_page {
        progress.current_page = page;
    }
    if let Some(rating) = update.rating {
        progress.rating = Some(rating);
    }
    progress.percent = percent_read(progress.status, progress.current_page, total_pages);
}
