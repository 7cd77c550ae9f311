use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tenant_id: String,
    /// Sequence-allocated content identifier, unique within the tenant.
    pub content_id: i64,

    /// Lowercase hex SHA-256 of the raw bytes; the dedup key within a tenant.
    pub content_hash: String,
    /// Lowercase hex SHA-256 of the canonicalized form; back-filled lazily.
    pub canonical_hash: Option<String>,

    pub content_type: Option<String>,

    pub content: Vec<u8>,

    pub created_on: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
