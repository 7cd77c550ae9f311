use chrono::{DateTime, Utc};
use common::dto::{ArtifactMetaData, ArtifactReference, VersionMetaData};
use common::{Labels, VersionState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateArtifactRequest {
    pub artifact_id: String,
    /// Artifact type tag, e.g. "AVRO", "PROTOBUF", "JSON", "OPENAPI".
    pub artifact_type: String,
    /// Version string for the first version; generated when absent.
    pub version: Option<String>,
    /// Content as text.
    pub content: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub references: Vec<ArtifactReference>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateVersionRequest {
    pub version: Option<String>,
    pub content: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub references: Vec<ArtifactReference>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStateRequest {
    pub state: VersionState,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ArtifactResponse {
    pub group_id: String,
    pub artifact_id: String,
    pub artifact_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<ArtifactMetaData> for ArtifactResponse {
    fn from(meta: ArtifactMetaData) -> Self {
        Self {
            group_id: meta.group_id,
            artifact_id: meta.artifact_id,
            artifact_type: meta.artifact_type,
            name: meta.name,
            description: meta.description,
            owner: meta.owner,
            labels: meta.labels,
            created_on: meta.created_on,
            modified_on: meta.modified_on,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VersionResponse {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub version_ordinal: i32,
    pub global_id: i64,
    pub content_id: i64,
    pub state: VersionState,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<VersionMetaData> for VersionResponse {
    fn from(meta: VersionMetaData) -> Self {
        Self {
            group_id: meta.group_id,
            artifact_id: meta.artifact_id,
            version: meta.version,
            version_ordinal: meta.version_ordinal,
            global_id: meta.global_id,
            content_id: meta.content_id,
            state: meta.state,
            name: meta.name,
            description: meta.description,
            owner: meta.owner,
            labels: meta.labels,
            created_on: meta.created_on,
            modified_on: meta.modified_on,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateArtifactResponse {
    pub artifact: ArtifactResponse,
    pub version: VersionResponse,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VersionListResponse {
    pub versions: Vec<String>,
}
