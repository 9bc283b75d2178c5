use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A posted link or note, owned by whoever hashes to `identity_hash`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "link")]
pub struct Model {
    /// 24 hex characters, see `LinkId`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// SHA-512 of the submitter's address and the pepper, 128 hex characters.
    pub identity_hash: String,

    pub content: String,
    pub is_link: bool,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
