use chrono::{DateTime, Utc};
use common::dto::{
    ArtifactMetaData, ArtifactReference, Comment, ContentWrapper, EditableArtifactMetaData,
    EditableVersionMetaData, Gav, ImportEntity, StoredContent, VersionMetaData,
};
use common::{ContentHash, CoreError, EntityKind, VersionState};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use super::{labels_json, labels_parse, parse_hash, SqlStore};
use crate::entity::{artifact, artifact_rule, comment, content, content_reference, markdown, version};

/// Group a reference resolves into when it does not name one.
pub const DEFAULT_GROUP: &str = "default";

impl<'a, C: ConnectionTrait> SqlStore<'a, C> {
    // ----- artifacts ------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
        artifact_type: &str,
        artifact_meta: &EditableArtifactMetaData,
        version: Option<&str>,
        content_wrapper: &ContentWrapper,
        version_meta: &EditableVersionMetaData,
        strict_refs: bool,
        now: DateTime<Utc>,
    ) -> Result<(ArtifactMetaData, VersionMetaData), CoreError> {
        if self.artifact_exists(group_id, artifact_id).await? {
            return Err(CoreError::already_exists(
                EntityKind::Artifact,
                format!("{group_id}/{artifact_id}"),
            ));
        }
        self.ensure_group(group_id, now).await?;

        let version_string = version.map(str::to_string).unwrap_or_else(|| "1".into());
        let gav = Gav::new(group_id, artifact_id, version_string.clone());
        let (content_id, _) = self
            .put_content(content_wrapper, &gav, strict_refs, now)
            .await?;
        let global_id = self.next_global_id().await?;

        let artifact_model = artifact::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(group_id.to_string()),
            artifact_id: Set(artifact_id.to_string()),
            artifact_type: Set(artifact_type.to_string()),
            name: Set(artifact_meta.name.clone()),
            description: Set(artifact_meta.description.clone()),
            owner: Set(artifact_meta.owner.clone()),
            labels: Set(artifact_meta.labels.as_ref().and_then(labels_json)),
            created_on: Set(now),
            modified_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await?;

        let version_model = self
            .insert_version_row(
                group_id,
                artifact_id,
                &version_string,
                1,
                global_id,
                content_id,
                VersionState::Enabled,
                version_meta,
                now,
            )
            .await?;

        Ok((
            artifact_to_dto(artifact_model),
            version_to_dto(version_model),
        ))
    }

    pub async fn update_artifact_meta(
        &self,
        group_id: &str,
        artifact_id: &str,
        meta: &EditableArtifactMetaData,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let model = self.require_artifact(group_id, artifact_id).await?;
        let mut active: artifact::ActiveModel = model.into();
        if let Some(name) = &meta.name {
            active.name = Set(Some(name.clone()));
        }
        if let Some(description) = &meta.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(owner) = &meta.owner {
            active.owner = Set(Some(owner.clone()));
        }
        if let Some(labels) = &meta.labels {
            active.labels = Set(labels_json(labels));
        }
        active.modified_on = Set(now);
        active.update(self.conn()).await?;
        Ok(())
    }

    pub async fn update_artifact_owner(
        &self,
        group_id: &str,
        artifact_id: &str,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let model = self.require_artifact(group_id, artifact_id).await?;
        let mut active: artifact::ActiveModel = model.into();
        active.owner = Set(Some(owner.to_string()));
        active.modified_on = Set(now);
        active.update(self.conn()).await?;
        Ok(())
    }

    /// Delete the artifact and everything hanging off it. Returns the deleted
    /// version strings in ordinal order.
    pub async fn delete_artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        let model = self.require_artifact(group_id, artifact_id).await?;

        let versions = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .order_by_asc(version::Column::VersionOrdinal)
            .all(self.conn())
            .await?;

        let global_ids: Vec<i64> = versions.iter().map(|v| v.global_id).collect();
        let content_ids: BTreeSet<i64> = versions.iter().map(|v| v.content_id).collect();
        let version_strings: Vec<String> = versions.iter().map(|v| v.version.clone()).collect();

        if !global_ids.is_empty() {
            comment::Entity::delete_many()
                .filter(comment::Column::TenantId.eq(self.tenant()))
                .filter(comment::Column::GlobalId.is_in(global_ids.clone()))
                .exec(self.conn())
                .await?;
            markdown::Entity::delete_many()
                .filter(markdown::Column::TenantId.eq(self.tenant()))
                .filter(markdown::Column::GlobalId.is_in(global_ids))
                .exec(self.conn())
                .await?;
        }

        version::Entity::delete_many()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .exec(self.conn())
            .await?;

        artifact_rule::Entity::delete_many()
            .filter(artifact_rule::Column::TenantId.eq(self.tenant()))
            .filter(artifact_rule::Column::GroupId.eq(group_id))
            .filter(artifact_rule::Column::ArtifactId.eq(artifact_id))
            .exec(self.conn())
            .await?;

        artifact::Entity::delete_by_id(model.id)
            .exec(self.conn())
            .await?;

        for content_id in content_ids {
            self.gc_content(content_id).await?;
        }

        Ok(version_strings)
    }

    pub async fn delete_group_artifacts(&self, group_id: &str) -> Result<(), CoreError> {
        for artifact_id in self.list_artifact_ids(group_id).await? {
            self.delete_artifact(group_id, &artifact_id).await?;
        }
        Ok(())
    }

    pub async fn get_artifact_meta(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<ArtifactMetaData, CoreError> {
        Ok(artifact_to_dto(
            self.require_artifact(group_id, artifact_id).await?,
        ))
    }

    pub async fn artifact_exists(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<bool, CoreError> {
        Ok(self.find_artifact(group_id, artifact_id).await?.is_some())
    }

    pub async fn list_artifact_ids(&self, group_id: &str) -> Result<Vec<String>, CoreError> {
        let artifacts = artifact::Entity::find()
            .filter(artifact::Column::TenantId.eq(self.tenant()))
            .filter(artifact::Column::GroupId.eq(group_id))
            .order_by_asc(artifact::Column::ArtifactId)
            .all(self.conn())
            .await?;
        Ok(artifacts.into_iter().map(|a| a.artifact_id).collect())
    }

    pub async fn count_artifacts(&self) -> Result<u64, CoreError> {
        Ok(artifact::Entity::find()
            .filter(artifact::Column::TenantId.eq(self.tenant()))
            .count(self.conn())
            .await?)
    }

    pub(crate) async fn require_artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<artifact::Model, CoreError> {
        self.find_artifact(group_id, artifact_id).await?.ok_or_else(|| {
            CoreError::not_found(EntityKind::Artifact, format!("{group_id}/{artifact_id}"))
        })
    }

    async fn find_artifact(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Option<artifact::Model>, CoreError> {
        Ok(artifact::Entity::find()
            .filter(artifact::Column::TenantId.eq(self.tenant()))
            .filter(artifact::Column::GroupId.eq(group_id))
            .filter(artifact::Column::ArtifactId.eq(artifact_id))
            .one(self.conn())
            .await?)
    }

    // ----- versions -------------------------------------------------------

    pub async fn create_version(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: Option<&str>,
        content_wrapper: &ContentWrapper,
        version_meta: &EditableVersionMetaData,
        strict_refs: bool,
        now: DateTime<Utc>,
    ) -> Result<VersionMetaData, CoreError> {
        let artifact_model = self.require_artifact(group_id, artifact_id).await?;
        let ordinal = self.max_ordinal(group_id, artifact_id).await? + 1;

        let version_string = match version {
            Some(v) => {
                if self
                    .find_version_opt(&Gav::new(group_id, artifact_id, v))
                    .await?
                    .is_some()
                {
                    return Err(CoreError::already_exists(
                        EntityKind::Version,
                        format!("{group_id}/{artifact_id}/{v}"),
                    ));
                }
                v.to_string()
            }
            None => ordinal.to_string(),
        };

        let gav = Gav::new(group_id, artifact_id, version_string.clone());
        let (content_id, _) = self
            .put_content(content_wrapper, &gav, strict_refs, now)
            .await?;
        let global_id = self.next_global_id().await?;

        let model = self
            .insert_version_row(
                group_id,
                artifact_id,
                &version_string,
                ordinal,
                global_id,
                content_id,
                VersionState::Enabled,
                version_meta,
                now,
            )
            .await?;

        let mut artifact_active: artifact::ActiveModel = artifact_model.into();
        artifact_active.modified_on = Set(now);
        artifact_active.update(self.conn()).await?;

        Ok(version_to_dto(model))
    }

    pub async fn update_version_meta(
        &self,
        gav: &Gav,
        meta: &EditableVersionMetaData,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let model = self.find_version(gav).await?;
        let mut active: version::ActiveModel = model.into();
        if let Some(name) = &meta.name {
            active.name = Set(Some(name.clone()));
        }
        if let Some(description) = &meta.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(labels) = &meta.labels {
            active.labels = Set(labels_json(labels));
        }
        active.modified_on = Set(now);
        active.update(self.conn()).await?;
        Ok(())
    }

    pub async fn update_version_state(
        &self,
        gav: &Gav,
        to: VersionState,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let model = self.find_version(gav).await?;
        let from = model.state;
        if !VersionState::can_transition(from, to) {
            return Err(CoreError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if from == VersionState::Enabled
            && to != VersionState::Enabled
            && self.enabled_count(&gav.group_id, &gav.artifact_id).await? == 1
        {
            return Err(CoreError::conflict(format!(
                "{}/{} must keep at least one ENABLED version",
                gav.group_id, gav.artifact_id
            )));
        }
        let mut active: version::ActiveModel = model.into();
        active.state = Set(to);
        active.modified_on = Set(now);
        active.update(self.conn()).await?;
        Ok(())
    }

    /// Delete one version. Deleting the last remaining version deletes the
    /// artifact row as well.
    pub async fn delete_version(&self, gav: &Gav) -> Result<(), CoreError> {
        let model = self.find_version(gav).await?;
        let total = self.count_versions(&gav.group_id, &gav.artifact_id).await?;

        if total == 1 {
            self.delete_artifact(&gav.group_id, &gav.artifact_id)
                .await?;
            return Ok(());
        }

        if model.state == VersionState::Enabled
            && self.enabled_count(&gav.group_id, &gav.artifact_id).await? == 1
        {
            return Err(CoreError::conflict(format!(
                "{}/{} must keep at least one ENABLED version",
                gav.group_id, gav.artifact_id
            )));
        }

        comment::Entity::delete_many()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .filter(comment::Column::GlobalId.eq(model.global_id))
            .exec(self.conn())
            .await?;
        markdown::Entity::delete_many()
            .filter(markdown::Column::TenantId.eq(self.tenant()))
            .filter(markdown::Column::GlobalId.eq(model.global_id))
            .exec(self.conn())
            .await?;

        let content_id = model.content_id;
        version::Entity::delete_by_id(model.id).exec(self.conn()).await?;
        self.gc_content(content_id).await?;
        Ok(())
    }

    pub async fn get_version_meta(&self, gav: &Gav) -> Result<VersionMetaData, CoreError> {
        Ok(version_to_dto(self.find_version(gav).await?))
    }

    pub async fn get_version_meta_by_global_id(
        &self,
        global_id: i64,
    ) -> Result<VersionMetaData, CoreError> {
        let model = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GlobalId.eq(global_id))
            .one(self.conn())
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Version, global_id.to_string()))?;
        Ok(version_to_dto(model))
    }

    pub async fn list_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<String>, CoreError> {
        self.require_artifact(group_id, artifact_id).await?;
        let versions = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .order_by_asc(version::Column::VersionOrdinal)
            .all(self.conn())
            .await?;
        Ok(versions.into_iter().map(|v| v.version).collect())
    }

    pub async fn count_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<u64, CoreError> {
        Ok(version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .count(self.conn())
            .await?)
    }

    pub async fn count_total_versions(&self) -> Result<u64, CoreError> {
        Ok(version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .count(self.conn())
            .await?)
    }

    pub async fn versions_by_content_id(
        &self,
        content_id: i64,
    ) -> Result<Vec<VersionMetaData>, CoreError> {
        let versions = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::ContentId.eq(content_id))
            .order_by_asc(version::Column::GlobalId)
            .all(self.conn())
            .await?;
        Ok(versions.into_iter().map(version_to_dto).collect())
    }

    pub(crate) async fn find_version(&self, gav: &Gav) -> Result<version::Model, CoreError> {
        self.find_version_opt(gav)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Version, gav.to_string()))
    }

    async fn find_version_opt(&self, gav: &Gav) -> Result<Option<version::Model>, CoreError> {
        Ok(version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(&gav.group_id))
            .filter(version::Column::ArtifactId.eq(&gav.artifact_id))
            .filter(version::Column::Version.eq(&gav.version))
            .one(self.conn())
            .await?)
    }

    async fn max_ordinal(&self, group_id: &str, artifact_id: &str) -> Result<i32, CoreError> {
        let latest = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .order_by_desc(version::Column::VersionOrdinal)
            .limit(1)
            .one(self.conn())
            .await?;
        Ok(latest.map(|v| v.version_ordinal).unwrap_or(0))
    }

    async fn enabled_count(&self, group_id: &str, artifact_id: &str) -> Result<u64, CoreError> {
        Ok(version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::GroupId.eq(group_id))
            .filter(version::Column::ArtifactId.eq(artifact_id))
            .filter(version::Column::State.eq(VersionState::Enabled))
            .count(self.conn())
            .await?)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_version_row(
        &self,
        group_id: &str,
        artifact_id: &str,
        version_string: &str,
        ordinal: i32,
        global_id: i64,
        content_id: i64,
        state: VersionState,
        meta: &EditableVersionMetaData,
        now: DateTime<Utc>,
    ) -> Result<version::Model, CoreError> {
        Ok(version::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(group_id.to_string()),
            artifact_id: Set(artifact_id.to_string()),
            version: Set(version_string.to_string()),
            version_ordinal: Set(ordinal),
            global_id: Set(global_id),
            content_id: Set(content_id),
            state: Set(state),
            name: Set(meta.name.clone()),
            description: Set(meta.description.clone()),
            owner: Set(None),
            labels: Set(meta.labels.as_ref().and_then(labels_json)),
            created_on: Set(now),
            modified_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await?)
    }

    // ----- content --------------------------------------------------------

    /// Insert content if its hash is new within the tenant, returning the
    /// (possibly pre-existing) content id. References are stored with the
    /// first insertion and shared by every version that dedups onto the row.
    pub async fn put_content(
        &self,
        wrapper: &ContentWrapper,
        owner: &Gav,
        strict_refs: bool,
        now: DateTime<Utc>,
    ) -> Result<(i64, bool), CoreError> {
        let hash = ContentHash::compute(&wrapper.content);
        if let Some(existing) = self.find_content_by_hash(&hash).await? {
            return Ok((existing.content_id, false));
        }

        self.check_references(owner, &wrapper.references, strict_refs)
            .await?;

        let content_id = self.next_content_id().await?;
        content::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            content_id: Set(content_id),
            content_hash: Set(hash.to_hex()),
            canonical_hash: Set(None),
            content_type: Set(wrapper.content_type.clone()),
            content: Set(wrapper.content.clone()),
            created_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await?;

        self.insert_references(content_id, &wrapper.references)
            .await?;

        Ok((content_id, true))
    }

    pub async fn get_content_by_id(&self, content_id: i64) -> Result<StoredContent, CoreError> {
        let model = content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .filter(content::Column::ContentId.eq(content_id))
            .one(self.conn())
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Content, content_id.to_string()))?;
        self.content_to_stored(model).await
    }

    pub async fn get_content_by_hash(&self, hash: &ContentHash) -> Result<StoredContent, CoreError> {
        let model = self
            .find_content_by_hash(hash)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Content, hash.to_hex()))?;
        self.content_to_stored(model).await
    }

    pub async fn get_version_content(&self, gav: &Gav) -> Result<StoredContent, CoreError> {
        let version = self.find_version(gav).await?;
        self.get_content_by_id(version.content_id).await
    }

    /// Idempotent canonical-hash backfill. A missing row or a content hash
    /// mismatch means the content was concurrently deleted or replaced; both
    /// are no-ops.
    pub async fn update_canonical_hash(
        &self,
        content_id: i64,
        expected_content_hash: &ContentHash,
        canonical_hash: &ContentHash,
    ) -> Result<(), CoreError> {
        let Some(model) = content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .filter(content::Column::ContentId.eq(content_id))
            .one(self.conn())
            .await?
        else {
            return Ok(());
        };
        if model.content_hash != expected_content_hash.to_hex() {
            return Ok(());
        }
        let mut active: content::ActiveModel = model.into();
        active.canonical_hash = Set(Some(canonical_hash.to_hex()));
        active.update(self.conn()).await?;
        Ok(())
    }

    /// Global ids of versions whose content references the given version.
    pub async fn referencing_global_ids(&self, gav: &Gav) -> Result<Vec<i64>, CoreError> {
        let content_ids = self.referencing_content_ids(gav).await?;
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        let versions = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::ContentId.is_in(content_ids))
            .order_by_asc(version::Column::GlobalId)
            .all(self.conn())
            .await?;
        Ok(versions.into_iter().map(|v| v.global_id).collect())
    }

    /// Content ids whose reference list points at the given version.
    pub async fn referencing_content_ids(&self, gav: &Gav) -> Result<Vec<i64>, CoreError> {
        let references = content_reference::Entity::find()
            .filter(content_reference::Column::TenantId.eq(self.tenant()))
            .filter(content_reference::Column::TargetArtifactId.eq(&gav.artifact_id))
            .filter(content_reference::Column::TargetVersion.eq(&gav.version))
            .all(self.conn())
            .await?;
        let mut ids: Vec<i64> = references
            .into_iter()
            .filter(|r| {
                r.target_group_id.as_deref().unwrap_or(DEFAULT_GROUP) == gav.group_id
            })
            .map(|r| r.content_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub(crate) async fn load_references(
        &self,
        content_id: i64,
    ) -> Result<Vec<ArtifactReference>, CoreError> {
        let rows = content_reference::Entity::find()
            .filter(content_reference::Column::TenantId.eq(self.tenant()))
            .filter(content_reference::Column::ContentId.eq(content_id))
            .order_by_asc(content_reference::Column::Ordinal)
            .all(self.conn())
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ArtifactReference {
                group_id: r.target_group_id,
                artifact_id: r.target_artifact_id,
                version: r.target_version,
                name: r.name,
            })
            .collect())
    }

    /// Remove the content row iff no version references it any more.
    async fn gc_content(&self, content_id: i64) -> Result<(), CoreError> {
        let still_referenced = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(version::Column::ContentId.eq(content_id))
            .count(self.conn())
            .await?;
        if still_referenced > 0 {
            return Ok(());
        }
        content_reference::Entity::delete_many()
            .filter(content_reference::Column::TenantId.eq(self.tenant()))
            .filter(content_reference::Column::ContentId.eq(content_id))
            .exec(self.conn())
            .await?;
        content::Entity::delete_many()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .filter(content::Column::ContentId.eq(content_id))
            .exec(self.conn())
            .await?;
        Ok(())
    }

    async fn find_content_by_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<content::Model>, CoreError> {
        Ok(content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .filter(content::Column::ContentHash.eq(hash.to_hex()))
            .one(self.conn())
            .await?)
    }

    async fn content_to_stored(&self, model: content::Model) -> Result<StoredContent, CoreError> {
        let references = self.load_references(model.content_id).await?;
        Ok(StoredContent {
            content_id: model.content_id,
            content_type: model.content_type,
            content: model.content,
            content_hash: parse_hash(&model.content_hash)?,
            canonical_hash: model.canonical_hash.as_deref().map(parse_hash).transpose()?,
            references,
        })
    }

    async fn insert_references(
        &self,
        content_id: i64,
        references: &[ArtifactReference],
    ) -> Result<(), CoreError> {
        for (ordinal, reference) in references.iter().enumerate() {
            content_reference::ActiveModel {
                id: Set(Uuid::now_v7()),
                tenant_id: Set(self.tenant().to_string()),
                content_id: Set(content_id),
                ordinal: Set(ordinal as i32),
                target_group_id: Set(reference.group_id.clone()),
                target_artifact_id: Set(reference.artifact_id.clone()),
                target_version: Set(reference.version.clone()),
                name: Set(reference.name.clone()),
            }
            .insert(self.conn())
            .await?;
        }
        Ok(())
    }

    /// Reference admission: strict mode requires every reference to resolve
    /// to an existing version; both modes reject cycles through the tenant's
    /// stored reference graph.
    async fn check_references(
        &self,
        owner: &Gav,
        references: &[ArtifactReference],
        strict: bool,
    ) -> Result<(), CoreError> {
        if references.is_empty() {
            return Ok(());
        }

        for reference in references {
            if reference.artifact_id.is_empty() || reference.name.is_empty() {
                return Err(CoreError::reference_invalid(
                    "reference artifactId and name must be non-empty",
                ));
            }
            if strict {
                let target = resolve_target(reference);
                let Some(target) = target else {
                    return Err(CoreError::reference_invalid(format!(
                        "reference '{}' does not name a version",
                        reference.name
                    )));
                };
                if self.find_version_opt(&target).await?.is_none() {
                    return Err(CoreError::reference_invalid(format!(
                        "reference '{}' target {} does not exist",
                        reference.name, target
                    )));
                }
            }
        }

        self.ensure_no_cycle(owner, references).await
    }

    /// DFS over already-stored references. The new content cannot be reached
    /// from itself, so a cycle can only close back through `owner`.
    async fn ensure_no_cycle(
        &self,
        owner: &Gav,
        references: &[ArtifactReference],
    ) -> Result<(), CoreError> {
        let mut stack: Vec<Gav> = references.iter().filter_map(resolve_target).collect();
        let mut visited: HashSet<Gav> = HashSet::new();

        while let Some(target) = stack.pop() {
            if target == *owner {
                return Err(CoreError::reference_invalid(format!(
                    "reference cycle through {owner}"
                )));
            }
            if !visited.insert(target.clone()) {
                continue;
            }
            let Some(version) = self.find_version_opt(&target).await? else {
                continue;
            };
            for next in self.load_references(version.content_id).await? {
                if let Some(next) = resolve_target(&next) {
                    if !visited.contains(&next) {
                        stack.push(next);
                    }
                }
            }
        }
        Ok(())
    }

    // ----- comments -------------------------------------------------------

    pub async fn create_comment(
        &self,
        gav: &Gav,
        owner: Option<&str>,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, CoreError> {
        let version = self.find_version(gav).await?;
        let comment_id = self.next_comment_id().await?;
        comment::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(self.tenant().to_string()),
            comment_id: Set(comment_id),
            global_id: Set(version.global_id),
            owner: Set(owner.map(str::to_string)),
            created_on: Set(now),
            value: Set(value.to_string()),
        }
        .insert(self.conn())
        .await?;
        Ok(Comment {
            comment_id,
            global_id: version.global_id,
            owner: owner.map(str::to_string),
            created_on: now,
            value: value.to_string(),
        })
    }

    pub async fn update_comment(
        &self,
        gav: &Gav,
        comment_id: i64,
        value: &str,
    ) -> Result<(), CoreError> {
        let version = self.find_version(gav).await?;
        let model = self
            .find_comment(comment_id, version.global_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Comment, comment_id.to_string()))?;
        let mut active: comment::ActiveModel = model.into();
        active.value = Set(value.to_string());
        active.update(self.conn()).await?;
        Ok(())
    }

    pub async fn delete_comment(&self, gav: &Gav, comment_id: i64) -> Result<(), CoreError> {
        let version = self.find_version(gav).await?;
        let model = self
            .find_comment(comment_id, version.global_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Comment, comment_id.to_string()))?;
        comment::Entity::delete_by_id(model.id)
            .exec(self.conn())
            .await?;
        Ok(())
    }

    pub async fn list_comments(&self, gav: &Gav) -> Result<Vec<Comment>, CoreError> {
        let version = self.find_version(gav).await?;
        let comments = comment::Entity::find()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .filter(comment::Column::GlobalId.eq(version.global_id))
            .order_by_asc(comment::Column::CommentId)
            .all(self.conn())
            .await?;
        Ok(comments
            .into_iter()
            .map(|c| Comment {
                comment_id: c.comment_id,
                global_id: c.global_id,
                owner: c.owner,
                created_on: c.created_on,
                value: c.value,
            })
            .collect())
    }

    async fn find_comment(
        &self,
        comment_id: i64,
        global_id: i64,
    ) -> Result<Option<comment::Model>, CoreError> {
        Ok(comment::Entity::find()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .filter(comment::Column::CommentId.eq(comment_id))
            .filter(comment::Column::GlobalId.eq(global_id))
            .one(self.conn())
            .await?)
    }

    // ----- import ---------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn import_content(
        &self,
        content_id: i64,
        content_type: Option<String>,
        bytes: &[u8],
        content_hash: &ContentHash,
        canonical_hash: Option<&ContentHash>,
        references: &[ArtifactReference],
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let clash = content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .filter(
                content::Column::ContentId
                    .eq(content_id)
                    .or(content::Column::ContentHash.eq(content_hash.to_hex())),
            )
            .one(self.conn())
            .await?;
        if clash.is_some() {
            return Err(CoreError::already_exists(
                EntityKind::Content,
                content_id.to_string(),
            ));
        }

        content::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            content_id: Set(content_id),
            content_hash: Set(content_hash.to_hex()),
            canonical_hash: Set(canonical_hash.map(|h| h.to_hex())),
            content_type: Set(content_type),
            content: Set(bytes.to_vec()),
            created_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await?;
        self.insert_references(content_id, references).await?;
        self.advance_content_id(content_id).await?;
        Ok(())
    }

    pub(crate) async fn import_version(
        &self,
        entity: &ImportEntity,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let ImportEntity::Version {
            group_id,
            artifact_id,
            artifact_type,
            version,
            version_ordinal,
            global_id,
            content_id,
            state,
            name,
            description,
            owner,
            labels,
            created_on,
        } = entity
        else {
            return Err(CoreError::fatal("import_version on non-version entity"));
        };

        let gav = Gav::new(group_id.as_str(), artifact_id.as_str(), version.as_str());
        if self.find_version_opt(&gav).await?.is_some() {
            return Err(CoreError::already_exists(EntityKind::Version, gav.to_string()));
        }
        // The content row must have been imported (or created) first.
        self.get_content_by_id(*content_id).await?;

        if !self.artifact_exists(group_id, artifact_id).await? {
            self.ensure_group(group_id, now).await?;
            artifact::ActiveModel {
                tenant_id: Set(self.tenant().to_string()),
                group_id: Set(group_id.clone()),
                artifact_id: Set(artifact_id.clone()),
                artifact_type: Set(artifact_type.clone()),
                name: Set(None),
                description: Set(None),
                owner: Set(owner.clone()),
                labels: Set(None),
                created_on: Set(*created_on),
                modified_on: Set(now),
                ..Default::default()
            }
            .insert(self.conn())
            .await?;
        }

        version::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(group_id.clone()),
            artifact_id: Set(artifact_id.clone()),
            version: Set(version.clone()),
            version_ordinal: Set(*version_ordinal),
            global_id: Set(*global_id),
            content_id: Set(*content_id),
            state: Set(*state),
            name: Set(name.clone()),
            description: Set(description.clone()),
            owner: Set(owner.clone()),
            labels: Set(labels_json(labels)),
            created_on: Set(*created_on),
            modified_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn())
        .await?;
        self.advance_global_id(*global_id).await?;
        Ok(())
    }

    pub(crate) async fn import_comment(
        &self,
        comment_id: i64,
        global_id: i64,
        owner: Option<String>,
        created_on: DateTime<Utc>,
        value: &str,
    ) -> Result<(), CoreError> {
        self.get_version_meta_by_global_id(global_id).await?;
        let exists = comment::Entity::find()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .filter(comment::Column::CommentId.eq(comment_id))
            .one(self.conn())
            .await?;
        if exists.is_some() {
            return Err(CoreError::already_exists(
                EntityKind::Comment,
                comment_id.to_string(),
            ));
        }
        comment::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(self.tenant().to_string()),
            comment_id: Set(comment_id),
            global_id: Set(global_id),
            owner: Set(owner),
            created_on: Set(created_on),
            value: Set(value.to_string()),
        }
        .insert(self.conn())
        .await?;
        self.advance_comment_id(comment_id).await?;
        Ok(())
    }
}

/// Resolve a reference into concrete coordinates: a missing group means the
/// default group; a missing version cannot be resolved.
fn resolve_target(reference: &ArtifactReference) -> Option<Gav> {
    let version = reference.version.as_deref()?;
    Some(Gav::new(
        reference
            .group_id
            .clone()
            .unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        reference.artifact_id.clone(),
        version,
    ))
}

pub(crate) fn artifact_to_dto(model: artifact::Model) -> ArtifactMetaData {
    ArtifactMetaData {
        group_id: model.group_id,
        artifact_id: model.artifact_id,
        artifact_type: model.artifact_type,
        name: model.name,
        description: model.description,
        owner: model.owner,
        labels: labels_parse(model.labels.as_deref()),
        created_on: model.created_on,
        modified_on: model.modified_on,
    }
}

pub(crate) fn version_to_dto(model: version::Model) -> VersionMetaData {
    VersionMetaData {
        group_id: model.group_id,
        artifact_id: model.artifact_id,
        version: model.version,
        version_ordinal: model.version_ordinal,
        global_id: model.global_id,
        content_id: model.content_id,
        state: model.state,
        name: model.name,
        description: model.description,
        owner: model.owner,
        labels: labels_parse(model.labels.as_deref()),
        created_on: model.created_on,
        modified_on: model.modified_on,
    }
}
