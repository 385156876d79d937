use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::progress::{self, Entity as ProgressEntity};
use crate::models::{Participant, ProgressStatus};

use super::ServiceError;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    pub current_page: Option<i32>,
    pub rating: Option<i32>,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(page) = self.current_page
            && page < 0
        {
            return Err(ServiceError::Validation(
                "current page must not be negative".into(),
            ));
        }
        if let Some(rating) = self.rating
            && !(1..=5).contains(&rating)
        {
            return Err(ServiceError::Validation(
                "rating must be between 1 and 5".into(),
            ));
        }
        Ok(())
    }
}

/// Insert-or-update keyed on the store's UNIQUE(book_id, user_name).
///
/// Only fields the caller supplied make it into the conflict-update list,
/// so an omitted page or rating is left untouched server-side. That is
/// deliberately the opposite of `book_service::update_book`, which clears
/// omitted fields. Re-applying the same values is a no-op in effect.
pub async fn upsert_progress(
    db: &DatabaseConnection,
    book_id: &str,
    reader: Participant,
    update: ProgressUpdate,
) -> Result<(), ServiceError> {
    update.validate()?;

    let now = chrono::Utc::now().to_rfc3339();
    let row = progress::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        book_id: Set(book_id.to_owned()),
        user_name: Set(reader),
        progress: Set(update.status),
        current_page: Set(update.current_page.unwrap_or(0)),
        rating: Set(update.rating),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    let mut on_conflict = OnConflict::columns([
        progress::Column::BookId,
        progress::Column::UserName,
    ]);
    on_conflict.update_columns([progress::Column::Progress, progress::Column::UpdatedAt]);
    if update.current_page.is_some() {
        on_conflict.update_column(progress::Column::CurrentPage);
    }
    if update.rating.is_some() {
        on_conflict.update_column(progress::Column::Rating);
    }

    ProgressEntity::insert(row)
        .on_conflict(on_conflict)
        .exec(db)
        .await?;

    Ok(())
}
