use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two readers sharing the tracker. Not a stored entity: tables that
/// reference a reader store one of these names as TEXT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum Participant {
    #[sea_orm(string_value = "August")]
    August,
    #[sea_orm(string_value = "Viola")]
    Viola,
}

impl Participant {
    pub const BOTH: [Participant; 2] = [Participant::August, Participant::Viola];

    pub fn other(self) -> Participant {
        match self {
            Participant::August => Participant::Viola,
            Participant::Viola => Participant::August,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Participant::August => "August",
            Participant::Viola => "Viola",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reader's relationship to a book, ordered from "want it" to "done".
/// `current_page` is only meaningful while Started.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[sea_orm(string_value = "wishlist")]
    Wishlist,
    #[sea_orm(string_value = "not_started")]
    NotStarted,
    #[sea_orm(string_value = "started")]
    Started,
    #[sea_orm(string_value = "finished")]
    Finished,
}

impl Default for ProgressStatus {
    fn default() -> Self {
        ProgressStatus::NotStarted
    }
}
