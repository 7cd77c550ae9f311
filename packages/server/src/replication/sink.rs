use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{ActionValue, CoreError, Mutation, TenantId};
use journal::{Envelope, MessageKey};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::Coordinator;
use crate::sql::SqlStore;

/// The apply fell over in a way that must stop the consumer loop.
pub(crate) struct FatalApply;

/// Applies decoded journal records to local state, one transaction per
/// message, and completes the originating caller's coordinator slot.
pub(crate) struct Sink {
    db: DatabaseConnection,
    coordinator: Arc<Coordinator>,
    ready: watch::Receiver<bool>,
    /// Node-local advisory lock serializing applies against admin operations.
    apply_lock: Arc<Mutex<()>>,
    strict_refs: bool,
}

impl Sink {
    pub fn new(
        db: DatabaseConnection,
        coordinator: Arc<Coordinator>,
        ready: watch::Receiver<bool>,
        apply_lock: Arc<Mutex<()>>,
        strict_refs: bool,
    ) -> Self {
        Self {
            db,
            coordinator,
            ready,
            apply_lock,
            strict_refs,
        }
    }

    /// Apply one record. `Err(FatalApply)` aborts the consumer loop.
    pub async fn apply(&self, key: &MessageKey, value: &[u8]) -> Result<(), FatalApply> {
        let envelope = match Envelope::decode(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(%key.uuid, error = %e, "Undecodable journal envelope");
                self.coordinator.complete(
                    key.uuid,
                    Err(CoreError::fatal_caused("undecodable journal envelope", e)),
                );
                return Err(FatalApply);
            }
        };
        let ts = envelope.ts;
        let mutation = match envelope.into_mutation() {
            Ok(mutation) => mutation,
            Err(e) => {
                error!(%key.uuid, error = %e, "Undecodable journal payload");
                self.coordinator.complete(
                    key.uuid,
                    Err(CoreError::fatal_caused("undecodable journal payload", e)),
                );
                return Err(FatalApply);
            }
        };

        let tenant = TenantId::new(key.tenant_id.clone());
        let _guard = self.apply_lock.lock().await;

        let txn = match self.db.begin().await {
            Ok(txn) => txn,
            Err(e) => {
                self.coordinator
                    .complete(key.uuid, Err(CoreError::unavailable(e)));
                return Ok(());
            }
        };

        let result = dispatch(&txn, &tenant, &mutation, ts, self.strict_refs).await;

        let result = match result {
            Ok(value) => match txn.commit().await {
                Ok(()) => Ok(value),
                Err(e) => Err(CoreError::unavailable(e)),
            },
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(error = %rollback, "Rollback failed after apply error");
                }
                Err(e)
            }
        };

        match &result {
            Ok(_) => debug!(
                message_type = %key.message_type,
                %key.uuid,
                "Applied journal message"
            ),
            Err(e) if !*self.ready.borrow() && e.is_replay_benign() => {
                // Expected while replaying a journal suffix that is already
                // reflected in local state.
                debug!(
                    message_type = %key.message_type,
                    %key.uuid,
                    error = %e,
                    "Benign replay error before readiness"
                );
            }
            Err(e) => warn!(
                message_type = %key.message_type,
                %key.uuid,
                error = %e,
                "Journal message failed to apply"
            ),
        }

        let fatal = matches!(&result, Err(e) if e.is_fatal());
        self.coordinator.complete(key.uuid, result);
        if fatal {
            return Err(FatalApply);
        }
        Ok(())
    }
}

/// Dispatch one mutation to its apply-mode store method.
async fn dispatch(
    txn: &DatabaseTransaction,
    tenant: &TenantId,
    mutation: &Mutation,
    now: DateTime<Utc>,
    strict_refs: bool,
) -> Result<ActionValue, CoreError> {
    let store = SqlStore::new(txn, tenant.clone());

    match mutation {
        Mutation::CreateGroup { group } => {
            store.create_group(group).await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateGroup { group_id, meta } => {
            store.update_group(group_id, meta, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteGroup { group_id } => {
            store.delete_group(group_id).await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateArtifact {
            group_id,
            artifact_id,
            artifact_type,
            artifact_meta,
            version,
            content,
            version_meta,
        } => {
            let (artifact, version) = store
                .create_artifact(
                    group_id,
                    artifact_id,
                    artifact_type,
                    artifact_meta,
                    version.as_deref(),
                    content,
                    version_meta,
                    strict_refs,
                    now,
                )
                .await?;
            Ok(ActionValue::Artifact { artifact, version })
        }
        Mutation::UpdateArtifactMeta {
            group_id,
            artifact_id,
            meta,
        } => {
            store
                .update_artifact_meta(group_id, artifact_id, meta, now)
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateArtifactOwner {
            group_id,
            artifact_id,
            owner,
        } => {
            store
                .update_artifact_owner(group_id, artifact_id, owner, now)
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteArtifact {
            group_id,
            artifact_id,
        } => {
            let versions = store.delete_artifact(group_id, artifact_id).await?;
            Ok(ActionValue::Versions(versions))
        }
        Mutation::DeleteGroupArtifacts { group_id } => {
            store.delete_group_artifacts(group_id).await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateVersion {
            group_id,
            artifact_id,
            version,
            content,
            version_meta,
        } => {
            let meta = store
                .create_version(
                    group_id,
                    artifact_id,
                    version.as_deref(),
                    content,
                    version_meta,
                    strict_refs,
                    now,
                )
                .await?;
            Ok(ActionValue::Version(meta))
        }
        Mutation::UpdateVersionMeta { gav, meta } => {
            store.update_version_meta(gav, meta, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateVersionState { gav, state } => {
            store.update_version_state(gav, *state, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteVersion { gav } => {
            store.delete_version(gav).await?;
            Ok(ActionValue::None)
        }
        Mutation::SetMarkdown { gav, markdown } => {
            store.set_markdown(gav, markdown, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateContentCanonicalHash {
            content_id,
            content_hash,
            canonical_hash,
        } => {
            store
                .update_canonical_hash(*content_id, content_hash, canonical_hash)
                .await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateArtifactRule {
            group_id,
            artifact_id,
            rule_type,
            configuration,
        } => {
            store
                .create_artifact_rule(group_id, artifact_id, *rule_type, configuration)
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateArtifactRule {
            group_id,
            artifact_id,
            rule_type,
            configuration,
        } => {
            store
                .update_artifact_rule(group_id, artifact_id, *rule_type, configuration)
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteArtifactRule {
            group_id,
            artifact_id,
            rule_type,
        } => {
            store
                .delete_artifact_rule(group_id, artifact_id, *rule_type)
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteArtifactRules {
            group_id,
            artifact_id,
        } => {
            store.delete_artifact_rules(group_id, artifact_id).await?;
            Ok(ActionValue::None)
        }
        Mutation::CreateGlobalRule {
            rule_type,
            configuration,
        } => {
            store.create_global_rule(*rule_type, configuration).await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateGlobalRule {
            rule_type,
            configuration,
        } => {
            store.update_global_rule(*rule_type, configuration).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteGlobalRule { rule_type } => {
            store.delete_global_rule(*rule_type).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteGlobalRules => {
            store.delete_global_rules().await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateComment { gav, owner, value } => {
            let comment = store
                .create_comment(gav, owner.as_deref(), value, now)
                .await?;
            Ok(ActionValue::Comment(comment))
        }
        Mutation::UpdateComment {
            gav,
            comment_id,
            value,
        } => {
            store.update_comment(gav, *comment_id, value).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteComment { gav, comment_id } => {
            store.delete_comment(gav, *comment_id).await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateRoleMapping {
            principal_id,
            role,
            principal_name,
        } => {
            store
                .create_role_mapping(&common::dto::RoleMapping {
                    principal_id: principal_id.clone(),
                    role: role.clone(),
                    principal_name: principal_name.clone(),
                })
                .await?;
            Ok(ActionValue::None)
        }
        Mutation::UpdateRoleMapping { principal_id, role } => {
            store.update_role_mapping(principal_id, role).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteRoleMapping { principal_id } => {
            store.delete_role_mapping(principal_id).await?;
            Ok(ActionValue::None)
        }

        Mutation::CreateDownload {
            download_id,
            context,
        } => {
            let download_id = parse_download_id(download_id)?;
            store.create_download(download_id, context).await?;
            Ok(ActionValue::Text(download_id.to_string()))
        }
        Mutation::ConsumeDownload { download_id } => {
            let download_id = parse_download_id(download_id)?;
            let context = store.consume_download(download_id, now).await?;
            Ok(ActionValue::Download(context))
        }
        Mutation::DeleteExpiredDownloads => {
            store.delete_expired_downloads(now).await?;
            Ok(ActionValue::None)
        }

        Mutation::SetConfigProperty { name, value } => {
            store.set_config_property(name, value, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteConfigProperty { name } => {
            store.delete_config_property(name).await?;
            Ok(ActionValue::None)
        }

        Mutation::NextGlobalId => Ok(ActionValue::Id(store.next_global_id().await?)),
        Mutation::NextContentId => Ok(ActionValue::Id(store.next_content_id().await?)),
        Mutation::NextCommentId => Ok(ActionValue::Id(store.next_comment_id().await?)),
        Mutation::ResetGlobalId => {
            store.reset_global_id().await?;
            Ok(ActionValue::None)
        }
        Mutation::ResetContentId => {
            store.reset_content_id().await?;
            Ok(ActionValue::None)
        }
        Mutation::ResetCommentId => {
            store.reset_comment_id().await?;
            Ok(ActionValue::None)
        }

        Mutation::Import { entity } => {
            store.apply_import(entity, now).await?;
            Ok(ActionValue::None)
        }
        Mutation::DeleteAllUserData => {
            store.delete_all_user_data().await?;
            Ok(ActionValue::None)
        }
    }
}

fn parse_download_id(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw)
        .map_err(|e| CoreError::fatal_caused("malformed download id in journal message", e))
}
