use serde::{Deserialize, Serialize};

use crate::content::ContentHash;
use crate::dto::{
    ArtifactMetaData, Comment, ContentWrapper, DownloadContext, EditableArtifactMetaData,
    EditableGroupMetaData, EditableVersionMetaData, Gav, GroupMetaData, ImportEntity,
    VersionMetaData,
};
use crate::state::VersionState;
use crate::types::RuleType;

/// Journal routing scope of a mutation. Artifact-scoped messages for the same
/// coordinates must land in the same partition so per-artifact operations are
/// totally ordered; everything else shares the tenant-wide partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionScope {
    Artifact { group_id: String, artifact_id: String },
    Global,
}

/// One state mutation, serialized as the journal message payload. The fields
/// of each variant enumerate exactly the arguments of the corresponding write
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    CreateGroup {
        group: GroupMetaData,
    },
    UpdateGroup {
        group_id: String,
        meta: EditableGroupMetaData,
    },
    DeleteGroup {
        group_id: String,
    },

    CreateArtifact {
        group_id: String,
        artifact_id: String,
        artifact_type: String,
        artifact_meta: EditableArtifactMetaData,
        version: Option<String>,
        content: ContentWrapper,
        version_meta: EditableVersionMetaData,
    },
    UpdateArtifactMeta {
        group_id: String,
        artifact_id: String,
        meta: EditableArtifactMetaData,
    },
    UpdateArtifactOwner {
        group_id: String,
        artifact_id: String,
        owner: String,
    },
    DeleteArtifact {
        group_id: String,
        artifact_id: String,
    },
    DeleteGroupArtifacts {
        group_id: String,
    },

    CreateVersion {
        group_id: String,
        artifact_id: String,
        version: Option<String>,
        content: ContentWrapper,
        version_meta: EditableVersionMetaData,
    },
    UpdateVersionMeta {
        gav: Gav,
        meta: EditableVersionMetaData,
    },
    UpdateVersionState {
        gav: Gav,
        state: VersionState,
    },
    DeleteVersion {
        gav: Gav,
    },
    SetMarkdown {
        gav: Gav,
        markdown: String,
    },
    UpdateContentCanonicalHash {
        content_id: i64,
        content_hash: ContentHash,
        canonical_hash: ContentHash,
    },

    CreateArtifactRule {
        group_id: String,
        artifact_id: String,
        rule_type: RuleType,
        configuration: String,
    },
    UpdateArtifactRule {
        group_id: String,
        artifact_id: String,
        rule_type: RuleType,
        configuration: String,
    },
    DeleteArtifactRule {
        group_id: String,
        artifact_id: String,
        rule_type: RuleType,
    },
    DeleteArtifactRules {
        group_id: String,
        artifact_id: String,
    },
    CreateGlobalRule {
        rule_type: RuleType,
        configuration: String,
    },
    UpdateGlobalRule {
        rule_type: RuleType,
        configuration: String,
    },
    DeleteGlobalRule {
        rule_type: RuleType,
    },
    DeleteGlobalRules,

    CreateComment {
        gav: Gav,
        owner: Option<String>,
        value: String,
    },
    UpdateComment {
        gav: Gav,
        comment_id: i64,
        value: String,
    },
    DeleteComment {
        gav: Gav,
        comment_id: i64,
    },

    CreateRoleMapping {
        principal_id: String,
        role: String,
        principal_name: Option<String>,
    },
    UpdateRoleMapping {
        principal_id: String,
        role: String,
    },
    DeleteRoleMapping {
        principal_id: String,
    },

    CreateDownload {
        download_id: String,
        context: DownloadContext,
    },
    ConsumeDownload {
        download_id: String,
    },
    DeleteExpiredDownloads,

    SetConfigProperty {
        name: String,
        value: String,
    },
    DeleteConfigProperty {
        name: String,
    },

    NextGlobalId,
    NextContentId,
    NextCommentId,
    ResetGlobalId,
    ResetContentId,
    ResetCommentId,

    Import {
        entity: ImportEntity,
    },
    DeleteAllUserData,
}

impl Mutation {
    /// Stable message-type tag carried in the journal key.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::CreateGroup { .. } => "CreateGroup",
            Self::UpdateGroup { .. } => "UpdateGroup",
            Self::DeleteGroup { .. } => "DeleteGroup",
            Self::CreateArtifact { .. } => "CreateArtifact",
            Self::UpdateArtifactMeta { .. } => "UpdateArtifactMeta",
            Self::UpdateArtifactOwner { .. } => "UpdateArtifactOwner",
            Self::DeleteArtifact { .. } => "DeleteArtifact",
            Self::DeleteGroupArtifacts { .. } => "DeleteGroupArtifacts",
            Self::CreateVersion { .. } => "CreateVersion",
            Self::UpdateVersionMeta { .. } => "UpdateVersionMeta",
            Self::UpdateVersionState { .. } => "UpdateVersionState",
            Self::DeleteVersion { .. } => "DeleteVersion",
            Self::SetMarkdown { .. } => "SetMarkdown",
            Self::UpdateContentCanonicalHash { .. } => "UpdateContentCanonicalHash",
            Self::CreateArtifactRule { .. } => "CreateArtifactRule",
            Self::UpdateArtifactRule { .. } => "UpdateArtifactRule",
            Self::DeleteArtifactRule { .. } => "DeleteArtifactRule",
            Self::DeleteArtifactRules { .. } => "DeleteArtifactRules",
            Self::CreateGlobalRule { .. } => "CreateGlobalRule",
            Self::UpdateGlobalRule { .. } => "UpdateGlobalRule",
            Self::DeleteGlobalRule { .. } => "DeleteGlobalRule",
            Self::DeleteGlobalRules => "DeleteGlobalRules",
            Self::CreateComment { .. } => "CreateComment",
            Self::UpdateComment { .. } => "UpdateComment",
            Self::DeleteComment { .. } => "DeleteComment",
            Self::CreateRoleMapping { .. } => "CreateRoleMapping",
            Self::UpdateRoleMapping { .. } => "UpdateRoleMapping",
            Self::DeleteRoleMapping { .. } => "DeleteRoleMapping",
            Self::CreateDownload { .. } => "CreateDownload",
            Self::ConsumeDownload { .. } => "ConsumeDownload",
            Self::DeleteExpiredDownloads => "DeleteExpiredDownloads",
            Self::SetConfigProperty { .. } => "SetConfigProperty",
            Self::DeleteConfigProperty { .. } => "DeleteConfigProperty",
            Self::NextGlobalId => "NextGlobalId",
            Self::NextContentId => "NextContentId",
            Self::NextCommentId => "NextCommentId",
            Self::ResetGlobalId => "ResetGlobalId",
            Self::ResetContentId => "ResetContentId",
            Self::ResetCommentId => "ResetCommentId",
            Self::Import { .. } => "Import",
            Self::DeleteAllUserData => "DeleteAllUserData",
        }
    }

    /// Routing scope, from which the journal partition key is derived.
    pub fn partition_scope(&self) -> PartitionScope {
        match self {
            Self::CreateArtifact {
                group_id,
                artifact_id,
                ..
            }
            | Self::UpdateArtifactMeta {
                group_id,
                artifact_id,
                ..
            }
            | Self::UpdateArtifactOwner {
                group_id,
                artifact_id,
                ..
            }
            | Self::DeleteArtifact {
                group_id,
                artifact_id,
            }
            | Self::CreateVersion {
                group_id,
                artifact_id,
                ..
            }
            | Self::CreateArtifactRule {
                group_id,
                artifact_id,
                ..
            }
            | Self::UpdateArtifactRule {
                group_id,
                artifact_id,
                ..
            }
            | Self::DeleteArtifactRule {
                group_id,
                artifact_id,
                ..
            }
            | Self::DeleteArtifactRules {
                group_id,
                artifact_id,
            } => PartitionScope::Artifact {
                group_id: group_id.clone(),
                artifact_id: artifact_id.clone(),
            },
            Self::UpdateVersionMeta { gav, .. }
            | Self::UpdateVersionState { gav, .. }
            | Self::DeleteVersion { gav }
            | Self::SetMarkdown { gav, .. }
            | Self::CreateComment { gav, .. }
            | Self::UpdateComment { gav, .. }
            | Self::DeleteComment { gav, .. } => PartitionScope::Artifact {
                group_id: gav.group_id.clone(),
                artifact_id: gav.artifact_id.clone(),
            },
            _ => PartitionScope::Global,
        }
    }
}

/// Result of one applied mutation, delivered through the coordinator to the
/// originating caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionValue {
    None,
    Id(i64),
    Text(String),
    Versions(Vec<String>),
    Artifact {
        artifact: ArtifactMetaData,
        version: VersionMetaData,
    },
    Version(VersionMetaData),
    Comment(Comment),
    Download(DownloadContext),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::ArtifactReference;

    fn sample_create() -> Mutation {
        Mutation::CreateArtifact {
            group_id: "g1".into(),
            artifact_id: "a1".into(),
            artifact_type: "AVRO".into(),
            artifact_meta: EditableArtifactMetaData::default(),
            version: None,
            content: ContentWrapper {
                content_type: Some("application/json".into()),
                content: br#"{"type":"record"}"#.to_vec(),
                references: vec![ArtifactReference {
                    group_id: Some("g1".into()),
                    artifact_id: "dep".into(),
                    version: Some("1".into()),
                    name: "com.example.Dep".into(),
                }],
            },
            version_meta: EditableVersionMetaData::default(),
        }
    }

    #[test]
    fn serde_round_trip() {
        let mutation = sample_create();
        let json = serde_json::to_string(&mutation).unwrap();
        let parsed: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, parsed);
        assert!(json.contains("\"op\":\"create_artifact\""));
    }

    #[test]
    fn artifact_ops_are_artifact_scoped() {
        assert_eq!(
            sample_create().partition_scope(),
            PartitionScope::Artifact {
                group_id: "g1".into(),
                artifact_id: "a1".into()
            }
        );
        assert_eq!(
            Mutation::DeleteComment {
                gav: Gav::new("g1", "a1", "2"),
                comment_id: 7,
            }
            .partition_scope(),
            PartitionScope::Artifact {
                group_id: "g1".into(),
                artifact_id: "a1".into()
            }
        );
    }

    #[test]
    fn tenant_wide_ops_are_global_scoped() {
        for m in [
            Mutation::DeleteGroup {
                group_id: "g1".into(),
            },
            Mutation::CreateGlobalRule {
                rule_type: RuleType::Validity,
                configuration: "SYNTAX_ONLY".into(),
            },
            Mutation::NextGlobalId,
            Mutation::DeleteAllUserData,
        ] {
            assert_eq!(m.partition_scope(), PartitionScope::Global, "{m:?}");
        }
    }

    #[test]
    fn message_type_is_stable() {
        assert_eq!(sample_create().message_type(), "CreateArtifact");
        assert_eq!(Mutation::ResetGlobalId.message_type(), "ResetGlobalId");
    }
}
