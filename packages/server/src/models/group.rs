use chrono::{DateTime, Utc};
use common::dto::GroupMetaData;
use common::Labels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateGroupRequest {
    pub group_id: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateGroupRequest {
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GroupResponse {
    pub group_id: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<GroupMetaData> for GroupResponse {
    fn from(meta: GroupMetaData) -> Self {
        Self {
            group_id: meta.group_id,
            description: meta.description,
            owner: meta.owner,
            labels: meta.labels,
            created_on: meta.created_on,
            modified_on: meta.modified_on,
        }
    }
}
