use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_reference")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: String,
    /// Owning content row (tenant-scoped content id).
    pub content_id: i64,
    /// Position within the owning content's reference list.
    pub ordinal: i32,

    pub target_group_id: Option<String>,
    pub target_artifact_id: String,
    pub target_version: Option<String>,
    /// Reference name as used inside the content (e.g. a type name).
    pub name: String,
}

impl ActiveModelBehavior for ActiveModel {}
