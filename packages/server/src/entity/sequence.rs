use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Backing row for the id allocator. One row per `(tenant, sequence name)`;
/// `value` is the last allocated id.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "id_sequence")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: String,
    pub name: String,
    pub value: i64,
}

impl ActiveModelBehavior for ActiveModel {}
