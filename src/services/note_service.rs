use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Participant;
use crate::models::note::{self, Entity as NoteEntity};

use super::{ServiceError, is_missing_relation};

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub book_id: String,
    pub text: String,
    pub page_number: Option<i32>,
    pub author: Participant,
}

/// Notes for one book, newest-first. Same unprovisioned-schema tolerance
/// as the books list.
pub async fn list_notes(
    db: &DatabaseConnection,
    book_id: &str,
) -> Result<Vec<note::Model>, ServiceError> {
    match NoteEntity::find()
        .filter(note::Column::BookId.eq(book_id))
        .order_by_desc(note::Column::CreatedAt)
        .all(db)
        .await
    {
        Ok(notes) => Ok(notes),
        Err(e) if is_missing_relation(&e) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Single insert, no side effects beyond the row. Notes are never edited
/// afterwards.
pub async fn add_note(db: &DatabaseConnection, new: NewNote) -> Result<note::Model, ServiceError> {
    let text = new.text.trim();
    if text.is_empty() {
        return Err(ServiceError::Validation("note text must not be empty".into()));
    }
    if let Some(page) = new.page_number
        && page < 1
    {
        return Err(ServiceError::Validation(
            "page number must be positive".into(),
        ));
    }

    let note = note::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        book_id: Set(new.book_id),
        text: Set(text.to_owned()),
        page_number: Set(new.page_number),
        author: Set(new.author),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    Ok(note.insert(db).await?)
}
