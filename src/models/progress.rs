use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::participant::{Participant, ProgressStatus};

/// One reader's progress on one book. The store enforces
/// UNIQUE(book_id, user_name), so there is at most one row per pair;
/// writes go through an upsert keyed on that constraint.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub book_id: String,
    pub user_name: Participant,
    pub progress: ProgressStatus,
    pub current_page: i32,
    pub rating: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Book,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
