//! Book operations: the joined list view, create with best-effort progress
//! fan-out, full-field update, delete, plus the in-memory view filters and
//! reading stats the sidebar renders.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::book::{self, Entity as BookEntity};
use crate::models::progress::{self, Entity as ProgressEntity};
use crate::models::{BookWithProgress, Participant, ProgressStatus};

use super::{ServiceError, is_missing_relation};

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub cover_image_url: Option<String>,
    pub added_by: Participant,
    pub initial_status: Option<ProgressStatus>,
}

/// Full-field update. `None` for an optional field writes NULL - clearing,
/// not leave-unchanged - so callers must pass current values for fields
/// they keep. (Progress upserts behave differently on purpose; see
/// `progress_service`.)
#[derive(Debug, Clone, Deserialize)]
pub struct BookPatch {
    pub title: String,
    pub author: Option<String>,
    pub total_pages: Option<i32>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookView {
    Library,
    Wishlist,
    #[default]
    All,
}

/// All books newest-first, joined in memory with both readers' progress.
/// An unprovisioned books table reads as an empty collection, not an
/// error.
pub async fn list_books_with_progress(
    db: &DatabaseConnection,
) -> Result<Vec<BookWithProgress>, ServiceError> {
    let books = match BookEntity::find()
        .order_by_desc(book::Column::CreatedAt)
        .all(db)
        .await
    {
        Ok(books) => books,
        Err(e) if is_missing_relation(&e) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if books.is_empty() {
        return Ok(Vec::new());
    }

    // Any failure fetching progress degrades to "no rows": books still
    // render, with both readers defaulted to not_started.
    let progress_rows = match ProgressEntity::find().all(db).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Failed to fetch progress rows: {}", e);
            Vec::new()
        }
    };

    let mut by_pair: HashMap<(String, Participant), progress::Model> = HashMap::new();
    for row in progress_rows {
        by_pair.insert((row.book_id.clone(), row.user_name), row);
    }

    Ok(books
        .into_iter()
        .map(|book| {
            let august = by_pair.remove(&(book.id.clone(), Participant::August));
            let viola = by_pair.remove(&(book.id.clone(), Participant::Viola));
            BookWithProgress::assemble(book, august, viola)
        })
        .collect())
}

/// Insert the book, then give both readers a progress row up front: the
/// adder with the requested initial status, the other with not_started.
///
/// The fan-out is explicitly non-transactional. The book must exist even
/// if the convenience rows do not, so their failure is logged and
/// swallowed, never rolled back.
pub async fn add_book(db: &DatabaseConnection, new: NewBook) -> Result<book::Model, ServiceError> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let book = book::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.to_owned()),
        author: Set(normalize(new.author)),
        added_by: Set(new.added_by),
        cover_image_url: Set(normalize(new.cover_image_url)),
        total_pages: Set(None),
        created_at: Set(now.clone()),
    };
    let book = book.insert(db).await?;

    let initial = new.initial_status.unwrap_or_default();
    let rows = [
        (book.added_by, initial),
        (book.added_by.other(), ProgressStatus::NotStarted),
    ];
    for (reader, status) in rows {
        let row = progress::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            book_id: Set(book.id.clone()),
            user_name: Set(reader),
            progress: Set(status),
            current_page: Set(0),
            rating: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };
        if let Err(e) = row.insert(db).await {
            tracing::warn!("Failed to create progress row for {}: {}", reader, e);
        }
    }

    Ok(book)
}

pub async fn update_book(
    db: &DatabaseConnection,
    id: &str,
    patch: BookPatch,
) -> Result<book::Model, ServiceError> {
    let title = patch.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }
    if let Some(pages) = patch.total_pages
        && pages < 1
    {
        return Err(ServiceError::Validation(
            "total pages must be positive".into(),
        ));
    }

    let existing = BookEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let mut book: book::ActiveModel = existing.into();
    book.title = Set(title.to_owned());
    book.author = Set(normalize(patch.author));
    book.total_pages = Set(patch.total_pages);
    book.cover_image_url = Set(normalize(patch.cover_image_url));

    Ok(book.update(db).await?)
}

/// Delete the book row only. Progress and notes go with it via the
/// backend's ON DELETE CASCADE, not anything done here.
pub async fn delete_book(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
    let book = BookEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    book.delete(db).await?;
    Ok(())
}

pub fn filter_view(books: Vec<BookWithProgress>, view: BookView) -> Vec<BookWithProgress> {
    match view {
        BookView::All => books,
        BookView::Library => books.into_iter().filter(|b| !b.is_wishlisted()).collect(),
        BookView::Wishlist => books.into_iter().filter(|b| b.is_wishlisted()).collect(),
    }
}

/// Case-insensitive substring match over title and author, in memory.
pub fn filter_search(books: Vec<BookWithProgress>, query: &str) -> Vec<BookWithProgress> {
    let query = query.to_lowercase();
    books
        .into_iter()
        .filter(|book| {
            book.title.to_lowercase().contains(&query)
                || book
                    .author
                    .as_ref()
                    .is_some_and(|author| author.to_lowercase().contains(&query))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingStats {
    pub august_finished: usize,
    pub viola_finished: usize,
    pub finished_together: usize,
}

pub fn reading_stats(books: &[BookWithProgress]) -> ReadingStats {
    let finished =
        |p: &crate::models::ParticipantProgress| p.status == ProgressStatus::Finished;
    ReadingStats {
        august_finished: books.iter().filter(|b| finished(&b.august)).count(),
        viola_finished: books.iter().filter(|b| finished(&b.viola)).count(),
        finished_together: books
            .iter()
            .filter(|b| finished(&b.august) && finished(&b.viola))
            .count(),
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book;

    fn joined(id: &str, august: ProgressStatus, viola: ProgressStatus) -> BookWithProgress {
        let mut book = BookWithProgress::assemble(
            book::Model {
                id: id.to_string(),
                title: format!("Book {}", id),
                author: Some("Somebody".to_string()),
                added_by: Participant::August,
                cover_image_url: None,
                total_pages: None,
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
            None,
            None,
        );
        book.august.status = august;
        book.viola.status = viola;
        book
    }

    #[test]
    fn library_excludes_any_wishlisted_book() {
        let books = vec![
            joined("a", ProgressStatus::Started, ProgressStatus::NotStarted),
            joined("b", ProgressStatus::Wishlist, ProgressStatus::Started),
            joined("c", ProgressStatus::Finished, ProgressStatus::Wishlist),
        ];

        let library = filter_view(books.clone(), BookView::Library);
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].id, "a");

        let wishlist = filter_view(books, BookView::Wishlist);
        let ids: Vec<_> = wishlist.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn search_matches_title_or_author_case_insensitive() {
        let mut books = vec![
            joined("a", ProgressStatus::Started, ProgressStatus::Started),
            joined("b", ProgressStatus::Started, ProgressStatus::Started),
        ];
        books[0].title = "Dune".to_string();
        books[0].author = Some("Frank Herbert".to_string());
        books[1].title = "Emma".to_string();
        books[1].author = Some("Jane Austen".to_string());

        assert_eq!(filter_search(books.clone(), "dune").len(), 1);
        assert_eq!(filter_search(books.clone(), "HERBERT").len(), 1);
        assert_eq!(filter_search(books.clone(), "austen").len(), 1);
        assert_eq!(filter_search(books, "tolkien").len(), 0);
    }

    #[test]
    fn stats_count_finishes_per_reader_and_together() {
        let books = vec![
            joined("a", ProgressStatus::Finished, ProgressStatus::Finished),
            joined("b", ProgressStatus::Finished, ProgressStatus::Started),
            joined("c", ProgressStatus::NotStarted, ProgressStatus::Finished),
        ];
        let stats = reading_stats(&books);
        assert_eq!(stats.august_finished, 2);
        assert_eq!(stats.viola_finished, 2);
        assert_eq!(stats.finished_together, 1);
    }
}
