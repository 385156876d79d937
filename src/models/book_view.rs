use serde::{Deserialize, Serialize};

use super::participant::{Participant, ProgressStatus};
use super::{book, progress};

/// One reader's progress as rendered in the joined view. Books without a
/// stored row default to not_started / page 0 / no rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProgress {
    pub status: ProgressStatus,
    pub current_page: i32,
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
}

impl ParticipantProgress {
    fn from_row(row: Option<progress::Model>, total_pages: Option<i32>) -> Self {
        let (status, current_page, rating) = match row {
            Some(row) => (row.progress, row.current_page, row.rating),
            None => (ProgressStatus::NotStarted, 0, None),
        };
        Self {
            status,
            current_page,
            rating,
            percent: percent_read(status, current_page, total_pages),
        }
    }
}

/// Share of the book read, only meaningful while actually reading it and
/// only when the page count is known. 120 of 300 pages reads as 40.
pub fn percent_read(status: ProgressStatus, current_page: i32, total_pages: Option<i32>) -> Option<u8> {
    match (status, total_pages) {
        (ProgressStatus::Started, Some(total)) if total > 0 => {
            Some(((current_page.max(0) as i64 * 100 / total as i64).clamp(0, 100)) as u8)
        }
        _ => None,
    }
}

/// A book joined with both readers' progress: the shape every list view
/// renders from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookWithProgress {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub added_by: Participant,
    pub cover_image_url: Option<String>,
    pub total_pages: Option<i32>,
    pub created_at: String,
    pub august: ParticipantProgress,
    pub viola: ParticipantProgress,
}

impl BookWithProgress {
    pub fn assemble(
        book: book::Model,
        august: Option<progress::Model>,
        viola: Option<progress::Model>,
    ) -> Self {
        let total_pages = book.total_pages;
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            added_by: book.added_by,
            cover_image_url: book.cover_image_url,
            total_pages,
            created_at: book.created_at,
            august: ParticipantProgress::from_row(august, total_pages),
            viola: ParticipantProgress::from_row(viola, total_pages),
        }
    }

    pub fn progress_for(&self, reader: Participant) -> &ParticipantProgress {
        match reader {
            Participant::August => &self.august,
            Participant::Viola => &self.viola,
        }
    }

    pub fn progress_for_mut(&mut self, reader: Participant) -> &mut ParticipantProgress {
        match reader {
            Participant::August => &mut self.august,
            Participant::Viola => &mut self.viola,
        }
    }

    /// A book stays on the wishlist as long as either reader wants it; it
    /// only counts as a library book once nobody does.
    pub fn is_wishlisted(&self) -> bool {
        self.august.status == ProgressStatus::Wishlist
            || self.viola.status == ProgressStatus::Wishlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total_pages: Option<i32>) -> book::Model {
        book::Model {
            id: "b1".to_string(),
            title: "Dune".to_string(),
            author: Some("Herbert".to_string()),
            added_by: Participant::August,
            cover_image_url: None,
            total_pages,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn progress_row(status: ProgressStatus, current_page: i32) -> progress::Model {
        progress::Model {
            id: "p1".to_string(),
            book_id: "b1".to_string(),
            user_name: Participant::Viola,
            progress: status,
            current_page,
            rating: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn percent_is_page_share_while_reading() {
        assert_eq!(percent_read(ProgressStatus::Started, 120, Some(300)), Some(40));
        assert_eq!(percent_read(ProgressStatus::Started, 0, Some(300)), Some(0));
        assert_eq!(percent_read(ProgressStatus::Started, 400, Some(300)), Some(100));
    }

    #[test]
    fn percent_missing_outside_reading_or_without_pages() {
        assert_eq!(percent_read(ProgressStatus::NotStarted, 120, Some(300)), None);
        assert_eq!(percent_read(ProgressStatus::Finished, 300, Some(300)), None);
        assert_eq!(percent_read(ProgressStatus::Started, 120, None), None);
        assert_eq!(percent_read(ProgressStatus::Started, 120, Some(0)), None);
    }

    #[test]
    fn missing_rows_default_both_readers() {
        let joined = BookWithProgress::assemble(book(Some(300)), None, None);
        for reader in Participant::BOTH {
            let progress = joined.progress_for(reader);
            assert_eq!(progress.status, ProgressStatus::NotStarted);
            assert_eq!(progress.current_page, 0);
            assert_eq!(progress.rating, None);
            assert_eq!(progress.percent, None);
        }
    }

    #[test]
    fn joined_view_carries_percent() {
        let joined = BookWithProgress::assemble(
            book(Some(300)),
            None,
            Some(progress_row(ProgressStatus::Started, 120)),
        );
        assert_eq!(joined.viola.percent, Some(40));
        assert_eq!(joined.august.percent, None);
    }

    #[test]
    fn wishlist_when_either_reader_wants_it() {
        let mut joined = BookWithProgress::assemble(book(None), None, None);
        assert!(!joined.is_wishlisted());
        joined.viola.status = ProgressStatus::Wishlist;
        assert!(joined.is_wishlisted());
    }
}
