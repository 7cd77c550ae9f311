use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "config_property")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: String,
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub value: String,

    /// Staleness marker for peers caching dynamic configuration.
    pub modified_on: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
