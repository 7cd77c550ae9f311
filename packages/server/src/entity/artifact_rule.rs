use common::RuleType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artifact_rule")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: String,
    pub group_id: String,
    pub artifact_id: String,
    pub rule_type: RuleType,

    /// Opaque rule configuration string.
    #[sea_orm(column_type = "Text")]
    pub configuration: String,
}

impl ActiveModelBehavior for ActiveModel {}
