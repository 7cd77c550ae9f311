use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentHash;
use crate::state::VersionState;
use crate::types::{Labels, RuleType};

/// Full coordinates of one artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gav {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Gav {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for Gav {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.group_id, self.artifact_id, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetaData {
    pub group_id: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub labels: Labels,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableGroupMetaData {
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetaData {
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableArtifactMetaData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub labels: Option<Labels>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetaData {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Per-artifact monotonic ordering of versions.
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

impl VersionMetaData {
    pub fn gav(&self) -> Gav {
        Gav::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditableVersionMetaData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Labels>,
}

/// One entry of a version's reference list. Order is meaningful and preserved
/// as insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ArtifactReference {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub name: String,
}

/// Content as submitted by a caller: raw bytes plus declared type metadata
/// and the ordered reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentWrapper {
    pub content_type: Option<String>,
    pub content: Vec<u8>,
    pub references: Vec<ArtifactReference>,
}

/// A stored, deduplicated content row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    pub content_id: i64,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
    pub content_hash: ContentHash,
    pub canonical_hash: Option<ContentHash>,
    pub references: Vec<ArtifactReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub global_id: i64,
    pub owner: Option<String>,
    pub created_on: DateTime<Utc>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub principal_id: String,
    pub role: String,
    pub principal_name: Option<String>,
}

/// Context of a single-use download token. The context payload is opaque to
/// the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadContext {
    pub context: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigProperty {
    pub name: String,
    pub value: String,
    pub modified_on: DateTime<Utc>,
}

/// Closed set of search predicates. `Label` matches key presence (optionally
/// the exact value); `Property` requires the exact key/value pair. The text
/// filters are case-insensitive substring matches except `Group`, which is an
/// exact match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchFilter {
    Name(String),
    Group(String),
    Description(String),
    Label { key: String, value: Option<String> },
    GlobalId(i64),
    ContentId(i64),
    Owner(String),
    Property { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    Name,
    CreatedOn,
    GroupId,
    ArtifactId,
    Version,
    GlobalId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSearchResults {
    pub artifacts: Vec<ArtifactMetaData>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSearchResults {
    pub groups: Vec<GroupMetaData>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSearchResults {
    pub versions: Vec<VersionMetaData>,
    pub count: u64,
}

/// Entities of the import/export event stream. Each carries explicit ids so a
/// `preserve_global_id`/`preserve_content_id` import is replayable; applying
/// one advances the matching id sequence past the imported id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum ImportEntity {
    Group(GroupMetaData),
    Content {
        content_id: i64,
        content_type: Option<String>,
        content: Vec<u8>,
        content_hash: ContentHash,
        canonical_hash: Option<ContentHash>,
        references: Vec<ArtifactReference>,
    },
    Version {
        group_id: String,
        artifact_id: String,
        artifact_type: String,
        version: String,
        version_ordinal: i32,
        global_id: i64,
        content_id: i64,
        state: VersionState,
        name: Option<String>,
        description: Option<String>,
        owner: Option<String>,
        labels: Labels,
        created_on: DateTime<Utc>,
    },
    GlobalRule {
        rule_type: RuleType,
        configuration: String,
    },
    ArtifactRule {
        group_id: String,
        artifact_id: String,
        rule_type: RuleType,
        configuration: String,
    },
    Comment {
        comment_id: i64,
        global_id: i64,
        owner: Option<String>,
        created_on: DateTime<Utc>,
        value: String,
    },
}
