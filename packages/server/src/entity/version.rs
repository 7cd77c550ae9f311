use common::VersionState;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artifact_version")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tenant_id: String,
    pub group_id: String,
    pub artifact_id: String,
    /// Caller-provided or ordinal-derived version string.
    pub version: String,
    /// Monotonic per-artifact ordering; never reused within an artifact.
    pub version_ordinal: i32,

    /// Cluster-unique version identifier within the tenant.
    pub global_id: i64,
    /// Points at the deduplicated content row.
    pub content_id: i64,

    pub state: VersionState,

    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub owner: Option<String>,

    /// Canonical label map serialized as JSON text.
    #[sea_orm(column_type = "Text", nullable)]
    pub labels: Option<String>,

    pub created_on: DateTimeUtc,
    pub modified_on: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
