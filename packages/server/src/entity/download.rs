use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download")]
pub struct Model {
    /// Single-use download token.
    #[sea_orm(primary_key, auto_increment = false)]
    pub download_id: Uuid,

    pub tenant_id: String,

    /// Opaque download context, stored as JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub context: Json,

    pub expires_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
