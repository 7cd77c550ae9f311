use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Auxiliary markdown blob stored alongside a version. The core persists the
/// raw text only; rendering happens elsewhere.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "version_markdown")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: String,
    /// Global id of the owning version.
    pub global_id: i64,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub modified_on: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
