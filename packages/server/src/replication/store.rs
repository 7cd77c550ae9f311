use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::clock::{Clock, SystemClock};
use common::dto::{
    ArtifactSearchResults, Comment, ConfigProperty, ContentWrapper, DownloadContext,
    EditableArtifactMetaData, EditableGroupMetaData, EditableVersionMetaData, Gav, GroupMetaData,
    GroupSearchResults, ImportEntity, OrderBy, OrderDirection, RoleMapping, SearchFilter,
    StoredContent, VersionMetaData, VersionSearchResults,
};
use common::{ActionValue, ContentHash, CoreError, Mutation, RuleType, TenantId, VersionState};
use journal::Journal;
use sea_orm::DatabaseConnection;
use tokio::sync::{broadcast, watch, Mutex};
use uuid::Uuid;

use super::{ConsumerLoop, Coordinator, Sink, StorageEvent, Submitter};
use crate::rules::RuleRegistry;
use crate::sql::SqlStore;

/// A heartbeat older than this marks the consumer loop as stuck.
const HEARTBEAT_MAX_AGE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// How long a write waits for its own apply. Default 30 s.
    pub response_timeout: Duration,
    /// Journal poll timeout.
    pub poll_timeout: Duration,
    /// Bound of the poll-to-sink hand-off queue.
    pub channel_capacity: usize,
    /// Reject references that do not resolve to an existing version.
    pub strict_references: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_millis(1000),
            channel_capacity: 256,
            strict_references: true,
        }
    }
}

/// The public storage contract: reads served from local state, writes
/// replicated through the journal and acknowledged only after this node has
/// applied its own message.
pub struct RegistryStore {
    db: DatabaseConnection,
    coordinator: Arc<Coordinator>,
    submitter: Arc<Submitter>,
    rules: RuleRegistry,
    clock: Arc<dyn Clock>,
    ready_rx: watch::Receiver<bool>,
    events: broadcast::Sender<StorageEvent>,
    heartbeat: Arc<AtomicI64>,
    stopped: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    response_timeout: Duration,
}

impl RegistryStore {
    /// Wire up a node: coordinator, submitter, sink and consumer loop. The
    /// returned store is usable immediately; writes block until the node has
    /// caught up enough to apply them, reads may see pre-bootstrap state
    /// until `is_ready`.
    pub fn start(
        db: DatabaseConnection,
        journal: Arc<dyn Journal>,
        options: NodeOptions,
    ) -> Arc<Self> {
        Self::start_with_clock(db, journal, options, Arc::new(SystemClock))
    }

    pub fn start_with_clock(
        db: DatabaseConnection,
        journal: Arc<dyn Journal>,
        options: NodeOptions,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let coordinator = Coordinator::new();
        let submitter = Arc::new(Submitter::new(
            journal.producer(),
            coordinator.clone(),
            clock.clone(),
        ));
        let (ready_tx, ready_rx) = watch::channel(false);
        let (events, _) = broadcast::channel(16);
        let heartbeat = Arc::new(AtomicI64::new(clock.now().timestamp_millis()));
        let stopped = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let apply_lock = Arc::new(Mutex::new(()));

        let sink = Sink::new(
            db.clone(),
            coordinator.clone(),
            ready_rx.clone(),
            apply_lock,
            options.strict_references,
        );

        ConsumerLoop {
            journal,
            submitter: submitter.clone(),
            sink,
            tenant: TenantId::default(),
            ready_tx,
            events: events.clone(),
            heartbeat: heartbeat.clone(),
            stopped: stopped.clone(),
            alive: alive.clone(),
            poll_timeout: options.poll_timeout,
            channel_capacity: options.channel_capacity,
        }
        .spawn();

        Arc::new(Self {
            db,
            coordinator,
            submitter,
            rules: RuleRegistry::standard(),
            clock,
            ready_rx,
            events,
            heartbeat,
            stopped,
            alive,
            response_timeout: options.response_timeout,
        })
    }

    // ----- health ---------------------------------------------------------

    /// True once this node has observed its own bootstrap sentinel.
    pub fn is_ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Ready, not stopped, and the consumer loop polled recently.
    pub fn is_alive(&self) -> bool {
        let fresh = {
            let last = self.heartbeat.load(Ordering::Acquire);
            let age = self.clock.now().timestamp_millis().saturating_sub(last);
            age <= HEARTBEAT_MAX_AGE.as_millis() as i64
        };
        self.is_ready()
            && self.alive.load(Ordering::Acquire)
            && !self.stopped.load(Ordering::Acquire)
            && fresh
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Wait (bounded) for the node to become ready.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let mut rx = self.ready_rx.clone();
        let _ = tokio::time::timeout(timeout, async {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        self.is_ready()
    }

    /// Stop accepting writes and fail all pending waiters.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        self.coordinator.shutdown();
    }

    fn reader<'s>(&'s self, tenant: &TenantId) -> SqlStore<'s, DatabaseConnection> {
        SqlStore::new(&self.db, tenant.clone())
    }

    async fn execute(
        &self,
        tenant: &TenantId,
        mutation: Mutation,
    ) -> Result<ActionValue, CoreError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(CoreError::Shutdown);
        }
        let uuid = self.submitter.submit(tenant, &mutation).await?;
        self.coordinator
            .wait_for_response(uuid, self.response_timeout)
            .await
    }

    /// The effective rule set for content admission: artifact-level rules
    /// override global rules of the same type.
    async fn effective_rules(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<BTreeMap<RuleType, String>, CoreError> {
        let reader = self.reader(tenant);
        let mut rules: BTreeMap<RuleType, String> =
            reader.list_global_rules().await?.into_iter().collect();
        if reader.artifact_exists(group_id, artifact_id).await? {
            for (rule_type, configuration) in
                reader.list_artifact_rules(group_id, artifact_id).await?
            {
                rules.insert(rule_type, configuration);
            }
        }
        Ok(rules)
    }

    async fn enforce_rules(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        content: &ContentWrapper,
        artifact_type: &str,
    ) -> Result<(), CoreError> {
        let rules = self.effective_rules(tenant, group_id, artifact_id).await?;
        self.rules.enforce(&rules, content, artifact_type)
    }

    // ----- groups ---------------------------------------------------------

    pub async fn create_group(
        &self,
        tenant: &TenantId,
        group_id: &str,
        description: Option<String>,
        owner: Option<String>,
        labels: common::Labels,
    ) -> Result<(), CoreError> {
        let now = self.clock.now();
        let group = GroupMetaData {
            group_id: group_id.to_string(),
            description,
            owner,
            labels,
            created_on: now,
            modified_on: now,
        };
        self.execute(tenant, Mutation::CreateGroup { group })
            .await
            .map(drop)
    }

    pub async fn update_group(
        &self,
        tenant: &TenantId,
        group_id: &str,
        meta: EditableGroupMetaData,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateGroup {
                group_id: group_id.to_string(),
                meta,
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_group(&self, tenant: &TenantId, group_id: &str) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteGroup {
                group_id: group_id.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn get_group(
        &self,
        tenant: &TenantId,
        group_id: &str,
    ) -> Result<GroupMetaData, CoreError> {
        self.reader(tenant).get_group(group_id).await
    }

    pub async fn group_exists(&self, tenant: &TenantId, group_id: &str) -> Result<bool, CoreError> {
        self.reader(tenant).group_exists(group_id).await
    }

    pub async fn list_group_ids(&self, tenant: &TenantId) -> Result<Vec<String>, CoreError> {
        self.reader(tenant).list_group_ids().await
    }

    // ----- artifacts ------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_artifact(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        artifact_type: &str,
        artifact_meta: EditableArtifactMetaData,
        version: Option<String>,
        content: ContentWrapper,
        version_meta: EditableVersionMetaData,
    ) -> Result<(common::dto::ArtifactMetaData, VersionMetaData), CoreError> {
        self.enforce_rules(tenant, group_id, artifact_id, &content, artifact_type)
            .await?;
        let value = self
            .execute(
                tenant,
                Mutation::CreateArtifact {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                    artifact_type: artifact_type.to_string(),
                    artifact_meta,
                    version,
                    content,
                    version_meta,
                },
            )
            .await?;
        match value {
            ActionValue::Artifact { artifact, version } => Ok((artifact, version)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_artifact_meta(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        meta: EditableArtifactMetaData,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateArtifactMeta {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                meta,
            },
        )
        .await
        .map(drop)
    }

    pub async fn update_artifact_owner(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        owner: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateArtifactOwner {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                owner: owner.to_string(),
            },
        )
        .await
        .map(drop)
    }

    /// Returns the deleted version strings.
    pub async fn delete_artifact(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        let value = self
            .execute(
                tenant,
                Mutation::DeleteArtifact {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                },
            )
            .await?;
        match value {
            ActionValue::Versions(versions) => Ok(versions),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_group_artifacts(
        &self,
        tenant: &TenantId,
        group_id: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteGroupArtifacts {
                group_id: group_id.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn get_artifact_meta(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<common::dto::ArtifactMetaData, CoreError> {
        self.reader(tenant).get_artifact_meta(group_id, artifact_id).await
    }

    pub async fn artifact_exists(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<bool, CoreError> {
        self.reader(tenant).artifact_exists(group_id, artifact_id).await
    }

    pub async fn list_artifact_ids(
        &self,
        tenant: &TenantId,
        group_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        self.reader(tenant).list_artifact_ids(group_id).await
    }

    pub async fn count_artifacts(&self, tenant: &TenantId) -> Result<u64, CoreError> {
        self.reader(tenant).count_artifacts().await
    }

    // ----- versions -------------------------------------------------------

    pub async fn create_version(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        version: Option<String>,
        content: ContentWrapper,
        version_meta: EditableVersionMetaData,
    ) -> Result<VersionMetaData, CoreError> {
        let artifact_type = self
            .reader(tenant)
            .get_artifact_meta(group_id, artifact_id)
            .await?
            .artifact_type;
        self.enforce_rules(tenant, group_id, artifact_id, &content, &artifact_type)
            .await?;
        let value = self
            .execute(
                tenant,
                Mutation::CreateVersion {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                    version,
                    content,
                    version_meta,
                },
            )
            .await?;
        match value {
            ActionValue::Version(meta) => Ok(meta),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_version_meta(
        &self,
        tenant: &TenantId,
        gav: Gav,
        meta: EditableVersionMetaData,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::UpdateVersionMeta { gav, meta })
            .await
            .map(drop)
    }

    pub async fn update_version_state(
        &self,
        tenant: &TenantId,
        gav: Gav,
        state: VersionState,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::UpdateVersionState { gav, state })
            .await
            .map(drop)
    }

    pub async fn delete_version(&self, tenant: &TenantId, gav: Gav) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteVersion { gav })
            .await
            .map(drop)
    }

    pub async fn get_version_meta(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<VersionMetaData, CoreError> {
        self.reader(tenant).get_version_meta(gav).await
    }

    pub async fn get_version_meta_by_global_id(
        &self,
        tenant: &TenantId,
        global_id: i64,
    ) -> Result<VersionMetaData, CoreError> {
        self.reader(tenant)
            .get_version_meta_by_global_id(global_id)
            .await
    }

    pub async fn list_versions(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        self.reader(tenant).list_versions(group_id, artifact_id).await
    }

    pub async fn count_versions(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<u64, CoreError> {
        self.reader(tenant).count_versions(group_id, artifact_id).await
    }

    pub async fn count_total_versions(&self, tenant: &TenantId) -> Result<u64, CoreError> {
        self.reader(tenant).count_total_versions().await
    }

    // ----- content --------------------------------------------------------

    pub async fn get_version_content(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<StoredContent, CoreError> {
        self.reader(tenant).get_version_content(gav).await
    }

    pub async fn get_content_by_id(
        &self,
        tenant: &TenantId,
        content_id: i64,
    ) -> Result<StoredContent, CoreError> {
        self.reader(tenant).get_content_by_id(content_id).await
    }

    pub async fn get_content_by_hash(
        &self,
        tenant: &TenantId,
        hash: &ContentHash,
    ) -> Result<StoredContent, CoreError> {
        self.reader(tenant).get_content_by_hash(hash).await
    }

    pub async fn versions_by_content_id(
        &self,
        tenant: &TenantId,
        content_id: i64,
    ) -> Result<Vec<VersionMetaData>, CoreError> {
        self.reader(tenant).versions_by_content_id(content_id).await
    }

    pub async fn referencing_global_ids(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<Vec<i64>, CoreError> {
        self.reader(tenant).referencing_global_ids(gav).await
    }

    pub async fn referencing_content_ids(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<Vec<i64>, CoreError> {
        self.reader(tenant).referencing_content_ids(gav).await
    }

    /// Fetch content, back-filling the canonical hash lazily. The backfill is
    /// itself a journal message so every node's cache converges.
    pub async fn get_version_content_canonical(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<StoredContent, CoreError> {
        let mut stored = self.reader(tenant).get_version_content(gav).await?;
        if stored.canonical_hash.is_none() {
            let canonical = crate::canon::canonical_hash(&stored.content);
            self.execute(
                tenant,
                Mutation::UpdateContentCanonicalHash {
                    content_id: stored.content_id,
                    content_hash: stored.content_hash,
                    canonical_hash: canonical,
                },
            )
            .await?;
            stored.canonical_hash = Some(canonical);
        }
        Ok(stored)
    }

    // ----- rules ----------------------------------------------------------

    pub async fn create_global_rule(
        &self,
        tenant: &TenantId,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::CreateGlobalRule {
                rule_type,
                configuration: configuration.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn update_global_rule(
        &self,
        tenant: &TenantId,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateGlobalRule {
                rule_type,
                configuration: configuration.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_global_rule(
        &self,
        tenant: &TenantId,
        rule_type: RuleType,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteGlobalRule { rule_type })
            .await
            .map(drop)
    }

    pub async fn delete_global_rules(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteGlobalRules)
            .await
            .map(drop)
    }

    pub async fn get_global_rule(
        &self,
        tenant: &TenantId,
        rule_type: RuleType,
    ) -> Result<String, CoreError> {
        self.reader(tenant).get_global_rule(rule_type).await
    }

    pub async fn list_global_rules(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<(RuleType, String)>, CoreError> {
        self.reader(tenant).list_global_rules().await
    }

    pub async fn create_artifact_rule(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::CreateArtifactRule {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                rule_type,
                configuration: configuration.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn update_artifact_rule(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateArtifactRule {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                rule_type,
                configuration: configuration.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_artifact_rule(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteArtifactRule {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                rule_type,
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_artifact_rules(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteArtifactRules {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn get_artifact_rule(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
    ) -> Result<String, CoreError> {
        self.reader(tenant)
            .get_artifact_rule(group_id, artifact_id, rule_type)
            .await
    }

    pub async fn list_artifact_rules(
        &self,
        tenant: &TenantId,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<(RuleType, String)>, CoreError> {
        self.reader(tenant)
            .list_artifact_rules(group_id, artifact_id)
            .await
    }

    // ----- markdown -------------------------------------------------------

    pub async fn set_markdown(
        &self,
        tenant: &TenantId,
        gav: Gav,
        markdown: String,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::SetMarkdown { gav, markdown })
            .await
            .map(drop)
    }

    pub async fn get_markdown(&self, tenant: &TenantId, gav: &Gav) -> Result<String, CoreError> {
        self.reader(tenant).get_markdown(gav).await
    }

    // ----- comments -------------------------------------------------------

    pub async fn create_comment(
        &self,
        tenant: &TenantId,
        gav: Gav,
        owner: Option<String>,
        value: String,
    ) -> Result<Comment, CoreError> {
        let result = self
            .execute(tenant, Mutation::CreateComment { gav, owner, value })
            .await?;
        match result {
            ActionValue::Comment(comment) => Ok(comment),
            other => Err(unexpected(other)),
        }
    }

    pub async fn update_comment(
        &self,
        tenant: &TenantId,
        gav: Gav,
        comment_id: i64,
        value: String,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateComment {
                gav,
                comment_id,
                value,
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_comment(
        &self,
        tenant: &TenantId,
        gav: Gav,
        comment_id: i64,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteComment { gav, comment_id })
            .await
            .map(drop)
    }

    pub async fn list_comments(
        &self,
        tenant: &TenantId,
        gav: &Gav,
    ) -> Result<Vec<Comment>, CoreError> {
        self.reader(tenant).list_comments(gav).await
    }

    // ----- role mappings --------------------------------------------------

    pub async fn create_role_mapping(
        &self,
        tenant: &TenantId,
        mapping: RoleMapping,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::CreateRoleMapping {
                principal_id: mapping.principal_id,
                role: mapping.role,
                principal_name: mapping.principal_name,
            },
        )
        .await
        .map(drop)
    }

    pub async fn update_role_mapping(
        &self,
        tenant: &TenantId,
        principal_id: &str,
        role: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::UpdateRoleMapping {
                principal_id: principal_id.to_string(),
                role: role.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_role_mapping(
        &self,
        tenant: &TenantId,
        principal_id: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteRoleMapping {
                principal_id: principal_id.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn get_role_mapping(
        &self,
        tenant: &TenantId,
        principal_id: &str,
    ) -> Result<RoleMapping, CoreError> {
        self.reader(tenant).get_role_mapping(principal_id).await
    }

    pub async fn list_role_mappings(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RoleMapping>, CoreError> {
        self.reader(tenant).list_role_mappings().await
    }

    // ----- downloads ------------------------------------------------------

    pub async fn create_download(
        &self,
        tenant: &TenantId,
        context: DownloadContext,
    ) -> Result<String, CoreError> {
        let download_id = Uuid::new_v4().to_string();
        let result = self
            .execute(
                tenant,
                Mutation::CreateDownload {
                    download_id,
                    context,
                },
            )
            .await?;
        match result {
            ActionValue::Text(download_id) => Ok(download_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn consume_download(
        &self,
        tenant: &TenantId,
        download_id: &str,
    ) -> Result<DownloadContext, CoreError> {
        let result = self
            .execute(
                tenant,
                Mutation::ConsumeDownload {
                    download_id: download_id.to_string(),
                },
            )
            .await?;
        match result {
            ActionValue::Download(context) => Ok(context),
            other => Err(unexpected(other)),
        }
    }

    pub async fn delete_expired_downloads(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteExpiredDownloads)
            .await
            .map(drop)
    }

    // ----- config properties ----------------------------------------------

    pub async fn set_config_property(
        &self,
        tenant: &TenantId,
        name: &str,
        value: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::SetConfigProperty {
                name: name.to_string(),
                value: value.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn delete_config_property(
        &self,
        tenant: &TenantId,
        name: &str,
    ) -> Result<(), CoreError> {
        self.execute(
            tenant,
            Mutation::DeleteConfigProperty {
                name: name.to_string(),
            },
        )
        .await
        .map(drop)
    }

    pub async fn get_config_property(
        &self,
        tenant: &TenantId,
        name: &str,
    ) -> Result<ConfigProperty, CoreError> {
        self.reader(tenant).get_config_property(name).await
    }

    pub async fn list_config_properties(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ConfigProperty>, CoreError> {
        self.reader(tenant).list_config_properties().await
    }

    pub async fn stale_config_properties(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConfigProperty>, CoreError> {
        self.reader(tenant).stale_config_properties(since).await
    }

    // ----- ids ------------------------------------------------------------

    pub async fn next_global_id(&self, tenant: &TenantId) -> Result<i64, CoreError> {
        self.execute_id(tenant, Mutation::NextGlobalId).await
    }

    pub async fn next_content_id(&self, tenant: &TenantId) -> Result<i64, CoreError> {
        self.execute_id(tenant, Mutation::NextContentId).await
    }

    pub async fn next_comment_id(&self, tenant: &TenantId) -> Result<i64, CoreError> {
        self.execute_id(tenant, Mutation::NextCommentId).await
    }

    pub async fn reset_global_id(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::ResetGlobalId).await.map(drop)
    }

    pub async fn reset_content_id(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::ResetContentId).await.map(drop)
    }

    pub async fn reset_comment_id(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::ResetCommentId).await.map(drop)
    }

    async fn execute_id(&self, tenant: &TenantId, mutation: Mutation) -> Result<i64, CoreError> {
        match self.execute(tenant, mutation).await? {
            ActionValue::Id(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    // ----- search ---------------------------------------------------------

    pub async fn search_artifacts(
        &self,
        tenant: &TenantId,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<ArtifactSearchResults, CoreError> {
        self.reader(tenant)
            .search_artifacts(filters, order_by, dir, offset, limit)
            .await
    }

    pub async fn search_groups(
        &self,
        tenant: &TenantId,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<GroupSearchResults, CoreError> {
        self.reader(tenant)
            .search_groups(filters, order_by, dir, offset, limit)
            .await
    }

    pub async fn search_versions(
        &self,
        tenant: &TenantId,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<VersionSearchResults, CoreError> {
        self.reader(tenant)
            .search_versions(filters, order_by, dir, offset, limit)
            .await
    }

    // ----- import / export / admin ----------------------------------------

    pub async fn import_entity(
        &self,
        tenant: &TenantId,
        entity: ImportEntity,
    ) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::Import { entity })
            .await
            .map(drop)
    }

    pub async fn export_data(&self, tenant: &TenantId) -> Result<Vec<ImportEntity>, CoreError> {
        self.reader(tenant).export_tenant().await
    }

    pub async fn delete_all_user_data(&self, tenant: &TenantId) -> Result<(), CoreError> {
        self.execute(tenant, Mutation::DeleteAllUserData)
            .await
            .map(drop)
    }
}

fn unexpected(value: ActionValue) -> CoreError {
    CoreError::fatal(format!("unexpected apply result shape: {value:?}"))
}
