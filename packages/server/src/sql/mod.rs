mod artifacts;
mod ids;
mod search;

pub use ids::{COMMENT_ID_SEQ, CONTENT_ID_SEQ, GLOBAL_ID_SEQ};

use chrono::{DateTime, Utc};
use common::dto::{
    ConfigProperty, DownloadContext, EditableGroupMetaData, Gav, GroupMetaData, ImportEntity,
    RoleMapping,
};
use common::types::Labels;
use common::{CoreError, EntityKind, RuleType, TenantId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{
    artifact, artifact_rule, comment, config_property, content, content_reference, download,
    global_rule, group, markdown, role_mapping, sequence, version,
};

/// Synchronous relational store over one connection or open transaction.
///
/// This is the apply side of the dual-mode facade: the sink calls these
/// methods inside a single transaction per journal message, and the public
/// facade calls the read methods directly. Mutations never run outside the
/// sink, so preconditions checked here are race-free.
pub struct SqlStore<'a, C: ConnectionTrait> {
    conn: &'a C,
    tenant: TenantId,
}

impl<'a, C: ConnectionTrait> SqlStore<'a, C> {
    pub fn new(conn: &'a C, tenant: TenantId) -> Self {
        Self { conn, tenant }
    }

    pub(crate) fn conn(&self) -> &'a C {
        self.conn
    }

    pub(crate) fn tenant(&self) -> &str {
        self.tenant.as_str()
    }

    // ----- groups ---------------------------------------------------------

    pub async fn create_group(&self, meta: &GroupMetaData) -> Result<(), CoreError> {
        if self.group_exists(&meta.group_id).await? {
            return Err(CoreError::already_exists(EntityKind::Group, &meta.group_id));
        }
        group::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(meta.group_id.clone()),
            description: Set(meta.description.clone()),
            owner: Set(meta.owner.clone()),
            labels: Set(labels_json(&meta.labels)),
            created_on: Set(meta.created_on),
            modified_on: Set(meta.modified_on),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    /// Create the group row lazily on first artifact if it does not exist.
    pub async fn ensure_group(&self, group_id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.group_exists(group_id).await? {
            return Ok(());
        }
        group::ActiveModel {
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(group_id.to_string()),
            created_on: Set(now),
            modified_on: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    pub async fn update_group(
        &self,
        group_id: &str,
        meta: &EditableGroupMetaData,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let model = self.find_group(group_id).await?;
        let mut active: group::ActiveModel = model.into();
        if let Some(description) = &meta.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(labels) = &meta.labels {
            active.labels = Set(labels_json(labels));
        }
        active.modified_on = Set(now);
        active.update(self.conn).await?;
        Ok(())
    }

    /// Delete the group and cascade every artifact within it.
    pub async fn delete_group(&self, group_id: &str) -> Result<(), CoreError> {
        let model = self.find_group(group_id).await?;
        self.delete_group_artifacts(group_id).await?;
        group::Entity::delete_by_id(model.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_group(&self, group_id: &str) -> Result<GroupMetaData, CoreError> {
        Ok(group_to_dto(self.find_group(group_id).await?))
    }

    pub async fn group_exists(&self, group_id: &str) -> Result<bool, CoreError> {
        Ok(self.find_group_opt(group_id).await?.is_some())
    }

    pub async fn list_group_ids(&self) -> Result<Vec<String>, CoreError> {
        let groups = group::Entity::find()
            .filter(group::Column::TenantId.eq(self.tenant()))
            .order_by_asc(group::Column::GroupId)
            .all(self.conn)
            .await?;
        Ok(groups.into_iter().map(|g| g.group_id).collect())
    }

    async fn find_group(&self, group_id: &str) -> Result<group::Model, CoreError> {
        self.find_group_opt(group_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Group, group_id))
    }

    async fn find_group_opt(&self, group_id: &str) -> Result<Option<group::Model>, CoreError> {
        Ok(group::Entity::find()
            .filter(group::Column::TenantId.eq(self.tenant()))
            .filter(group::Column::GroupId.eq(group_id))
            .one(self.conn)
            .await?)
    }

    // ----- rules ----------------------------------------------------------

    pub async fn create_global_rule(
        &self,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        if self.find_global_rule(rule_type).await?.is_some() {
            return Err(CoreError::already_exists(
                EntityKind::Rule,
                rule_type.as_str(),
            ));
        }
        global_rule::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(self.tenant().to_string()),
            rule_type: Set(rule_type),
            configuration: Set(configuration.to_string()),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    pub async fn update_global_rule(
        &self,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        let model = self
            .find_global_rule(rule_type)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Rule, rule_type.as_str()))?;
        let mut active: global_rule::ActiveModel = model.into();
        active.configuration = Set(configuration.to_string());
        active.update(self.conn).await?;
        Ok(())
    }

    pub async fn delete_global_rule(&self, rule_type: RuleType) -> Result<(), CoreError> {
        let model = self
            .find_global_rule(rule_type)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Rule, rule_type.as_str()))?;
        global_rule::Entity::delete_by_id(model.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete_global_rules(&self) -> Result<(), CoreError> {
        global_rule::Entity::delete_many()
            .filter(global_rule::Column::TenantId.eq(self.tenant()))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_global_rule(&self, rule_type: RuleType) -> Result<String, CoreError> {
        self.find_global_rule(rule_type)
            .await?
            .map(|m| m.configuration)
            .ok_or_else(|| CoreError::not_found(EntityKind::Rule, rule_type.as_str()))
    }

    pub async fn list_global_rules(&self) -> Result<Vec<(RuleType, String)>, CoreError> {
        let rules = global_rule::Entity::find()
            .filter(global_rule::Column::TenantId.eq(self.tenant()))
            .all(self.conn)
            .await?;
        Ok(rules
            .into_iter()
            .map(|m| (m.rule_type, m.configuration))
            .collect())
    }

    async fn find_global_rule(
        &self,
        rule_type: RuleType,
    ) -> Result<Option<global_rule::Model>, CoreError> {
        Ok(global_rule::Entity::find()
            .filter(global_rule::Column::TenantId.eq(self.tenant()))
            .filter(global_rule::Column::RuleType.eq(rule_type))
            .one(self.conn)
            .await?)
    }

    pub async fn create_artifact_rule(
        &self,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        self.require_artifact(group_id, artifact_id).await?;
        if self
            .find_artifact_rule(group_id, artifact_id, rule_type)
            .await?
            .is_some()
        {
            return Err(CoreError::already_exists(
                EntityKind::Rule,
                format!("{group_id}/{artifact_id}/{rule_type}"),
            ));
        }
        artifact_rule::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(self.tenant().to_string()),
            group_id: Set(group_id.to_string()),
            artifact_id: Set(artifact_id.to_string()),
            rule_type: Set(rule_type),
            configuration: Set(configuration.to_string()),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    pub async fn update_artifact_rule(
        &self,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
        configuration: &str,
    ) -> Result<(), CoreError> {
        let model = self
            .find_artifact_rule(group_id, artifact_id, rule_type)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(
                    EntityKind::Rule,
                    format!("{group_id}/{artifact_id}/{rule_type}"),
                )
            })?;
        let mut active: artifact_rule::ActiveModel = model.into();
        active.configuration = Set(configuration.to_string());
        active.update(self.conn).await?;
        Ok(())
    }

    pub async fn delete_artifact_rule(
        &self,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
    ) -> Result<(), CoreError> {
        let model = self
            .find_artifact_rule(group_id, artifact_id, rule_type)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(
                    EntityKind::Rule,
                    format!("{group_id}/{artifact_id}/{rule_type}"),
                )
            })?;
        artifact_rule::Entity::delete_by_id(model.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete_artifact_rules(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<(), CoreError> {
        self.require_artifact(group_id, artifact_id).await?;
        artifact_rule::Entity::delete_many()
            .filter(artifact_rule::Column::TenantId.eq(self.tenant()))
            .filter(artifact_rule::Column::GroupId.eq(group_id))
            .filter(artifact_rule::Column::ArtifactId.eq(artifact_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_artifact_rule(
        &self,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
    ) -> Result<String, CoreError> {
        self.find_artifact_rule(group_id, artifact_id, rule_type)
            .await?
            .map(|m| m.configuration)
            .ok_or_else(|| {
                CoreError::not_found(
                    EntityKind::Rule,
                    format!("{group_id}/{artifact_id}/{rule_type}"),
                )
            })
    }

    pub async fn list_artifact_rules(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<(RuleType, String)>, CoreError> {
        let rules = artifact_rule::Entity::find()
            .filter(artifact_rule::Column::TenantId.eq(self.tenant()))
            .filter(artifact_rule::Column::GroupId.eq(group_id))
            .filter(artifact_rule::Column::ArtifactId.eq(artifact_id))
            .all(self.conn)
            .await?;
        Ok(rules
            .into_iter()
            .map(|m| (m.rule_type, m.configuration))
            .collect())
    }

    async fn find_artifact_rule(
        &self,
        group_id: &str,
        artifact_id: &str,
        rule_type: RuleType,
    ) -> Result<Option<artifact_rule::Model>, CoreError> {
        Ok(artifact_rule::Entity::find()
            .filter(artifact_rule::Column::TenantId.eq(self.tenant()))
            .filter(artifact_rule::Column::GroupId.eq(group_id))
            .filter(artifact_rule::Column::ArtifactId.eq(artifact_id))
            .filter(artifact_rule::Column::RuleType.eq(rule_type))
            .one(self.conn)
            .await?)
    }

    // ----- role mappings --------------------------------------------------

    pub async fn create_role_mapping(&self, mapping: &RoleMapping) -> Result<(), CoreError> {
        if self
            .find_role_mapping(&mapping.principal_id)
            .await?
            .is_some()
        {
            return Err(CoreError::already_exists(
                EntityKind::RoleMapping,
                &mapping.principal_id,
            ));
        }
        role_mapping::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(self.tenant().to_string()),
            principal_id: Set(mapping.principal_id.clone()),
            role: Set(mapping.role.clone()),
            principal_name: Set(mapping.principal_name.clone()),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    pub async fn update_role_mapping(
        &self,
        principal_id: &str,
        role: &str,
    ) -> Result<(), CoreError> {
        let model = self
            .find_role_mapping(principal_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::RoleMapping, principal_id))?;
        let mut active: role_mapping::ActiveModel = model.into();
        active.role = Set(role.to_string());
        active.update(self.conn).await?;
        Ok(())
    }

    pub async fn delete_role_mapping(&self, principal_id: &str) -> Result<(), CoreError> {
        let model = self
            .find_role_mapping(principal_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::RoleMapping, principal_id))?;
        role_mapping::Entity::delete_by_id(model.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_role_mapping(&self, principal_id: &str) -> Result<RoleMapping, CoreError> {
        self.find_role_mapping(principal_id)
            .await?
            .map(|m| RoleMapping {
                principal_id: m.principal_id,
                role: m.role,
                principal_name: m.principal_name,
            })
            .ok_or_else(|| CoreError::not_found(EntityKind::RoleMapping, principal_id))
    }

    pub async fn list_role_mappings(&self) -> Result<Vec<RoleMapping>, CoreError> {
        let mappings = role_mapping::Entity::find()
            .filter(role_mapping::Column::TenantId.eq(self.tenant()))
            .order_by_asc(role_mapping::Column::PrincipalId)
            .all(self.conn)
            .await?;
        Ok(mappings
            .into_iter()
            .map(|m| RoleMapping {
                principal_id: m.principal_id,
                role: m.role,
                principal_name: m.principal_name,
            })
            .collect())
    }

    async fn find_role_mapping(
        &self,
        principal_id: &str,
    ) -> Result<Option<role_mapping::Model>, CoreError> {
        Ok(role_mapping::Entity::find()
            .filter(role_mapping::Column::TenantId.eq(self.tenant()))
            .filter(role_mapping::Column::PrincipalId.eq(principal_id))
            .one(self.conn)
            .await?)
    }

    // ----- downloads ------------------------------------------------------

    pub async fn create_download(
        &self,
        download_id: Uuid,
        context: &DownloadContext,
    ) -> Result<(), CoreError> {
        download::ActiveModel {
            download_id: Set(download_id),
            tenant_id: Set(self.tenant().to_string()),
            context: Set(context.context.clone()),
            expires_at: Set(context.expires_at),
        }
        .insert(self.conn)
        .await?;
        Ok(())
    }

    /// Single use: the row is removed whether or not it already expired, but
    /// only an unexpired token yields its context.
    pub async fn consume_download(
        &self,
        download_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DownloadContext, CoreError> {
        let model = download::Entity::find_by_id(download_id)
            .filter(download::Column::TenantId.eq(self.tenant()))
            .one(self.conn)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Download, download_id.to_string()))?;

        download::Entity::delete_by_id(download_id)
            .exec(self.conn)
            .await?;

        if model.expires_at <= now {
            return Err(CoreError::not_found(
                EntityKind::Download,
                download_id.to_string(),
            ));
        }
        Ok(DownloadContext {
            context: model.context,
            expires_at: model.expires_at,
        })
    }

    pub async fn delete_expired_downloads(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        download::Entity::delete_many()
            .filter(download::Column::TenantId.eq(self.tenant()))
            .filter(download::Column::ExpiresAt.lte(now))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    // ----- config properties ----------------------------------------------

    pub async fn set_config_property(
        &self,
        name: &str,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        match self.find_config_property(name).await? {
            Some(model) => {
                let mut active: config_property::ActiveModel = model.into();
                active.value = Set(value.to_string());
                active.modified_on = Set(now);
                active.update(self.conn).await?;
            }
            None => {
                config_property::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    tenant_id: Set(self.tenant().to_string()),
                    name: Set(name.to_string()),
                    value: Set(value.to_string()),
                    modified_on: Set(now),
                }
                .insert(self.conn)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn delete_config_property(&self, name: &str) -> Result<(), CoreError> {
        let model = self
            .find_config_property(name)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::ConfigProperty, name))?;
        config_property::Entity::delete_by_id(model.id)
            .exec(self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_config_property(&self, name: &str) -> Result<ConfigProperty, CoreError> {
        self.find_config_property(name)
            .await?
            .map(config_to_dto)
            .ok_or_else(|| CoreError::not_found(EntityKind::ConfigProperty, name))
    }

    pub async fn list_config_properties(&self) -> Result<Vec<ConfigProperty>, CoreError> {
        let properties = config_property::Entity::find()
            .filter(config_property::Column::TenantId.eq(self.tenant()))
            .order_by_asc(config_property::Column::Name)
            .all(self.conn)
            .await?;
        Ok(properties.into_iter().map(config_to_dto).collect())
    }

    /// Properties modified at or after the cutoff, for peers refreshing
    /// cached dynamic configuration.
    pub async fn stale_config_properties(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConfigProperty>, CoreError> {
        let properties = config_property::Entity::find()
            .filter(config_property::Column::TenantId.eq(self.tenant()))
            .filter(config_property::Column::ModifiedOn.gte(since))
            .all(self.conn)
            .await?;
        Ok(properties.into_iter().map(config_to_dto).collect())
    }

    async fn find_config_property(
        &self,
        name: &str,
    ) -> Result<Option<config_property::Model>, CoreError> {
        Ok(config_property::Entity::find()
            .filter(config_property::Column::TenantId.eq(self.tenant()))
            .filter(config_property::Column::Name.eq(name))
            .one(self.conn)
            .await?)
    }

    // ----- markdown -------------------------------------------------------

    pub async fn set_markdown(
        &self,
        gav: &Gav,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let version = self.find_version(gav).await?;
        let existing = markdown::Entity::find()
            .filter(markdown::Column::TenantId.eq(self.tenant()))
            .filter(markdown::Column::GlobalId.eq(version.global_id))
            .one(self.conn)
            .await?;
        match existing {
            Some(model) => {
                let mut active: markdown::ActiveModel = model.into();
                active.content = Set(text.to_string());
                active.modified_on = Set(now);
                active.update(self.conn).await?;
            }
            None => {
                markdown::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    tenant_id: Set(self.tenant().to_string()),
                    global_id: Set(version.global_id),
                    content: Set(text.to_string()),
                    modified_on: Set(now),
                }
                .insert(self.conn)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn get_markdown(&self, gav: &Gav) -> Result<String, CoreError> {
        let version = self.find_version(gav).await?;
        markdown::Entity::find()
            .filter(markdown::Column::TenantId.eq(self.tenant()))
            .filter(markdown::Column::GlobalId.eq(version.global_id))
            .one(self.conn)
            .await?
            .map(|m| m.content)
            .ok_or_else(|| CoreError::not_found(EntityKind::Markdown, gav.to_string()))
    }

    // ----- import / export / wipe -----------------------------------------

    pub async fn apply_import(
        &self,
        entity: &ImportEntity,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        match entity {
            ImportEntity::Group(meta) => self.create_group(meta).await,
            ImportEntity::Content {
                content_id,
                content_type,
                content,
                content_hash,
                canonical_hash,
                references,
            } => {
                self.import_content(
                    *content_id,
                    content_type.clone(),
                    content,
                    content_hash,
                    canonical_hash.as_ref(),
                    references,
                    now,
                )
                .await
            }
            ImportEntity::Version { .. } => self.import_version(entity, now).await,
            ImportEntity::GlobalRule {
                rule_type,
                configuration,
            } => self.create_global_rule(*rule_type, configuration).await,
            ImportEntity::ArtifactRule {
                group_id,
                artifact_id,
                rule_type,
                configuration,
            } => {
                self.create_artifact_rule(group_id, artifact_id, *rule_type, configuration)
                    .await
            }
            ImportEntity::Comment {
                comment_id,
                global_id,
                owner,
                created_on,
                value,
            } => {
                self.import_comment(*comment_id, *global_id, owner.clone(), *created_on, value)
                    .await
            }
        }
    }

    /// Dump the tenant as an import event stream, dependency order: groups,
    /// contents, versions, rules, comments.
    pub async fn export_tenant(&self) -> Result<Vec<ImportEntity>, CoreError> {
        let mut entities = Vec::new();

        for g in group::Entity::find()
            .filter(group::Column::TenantId.eq(self.tenant()))
            .order_by_asc(group::Column::GroupId)
            .all(self.conn)
            .await?
        {
            entities.push(ImportEntity::Group(group_to_dto(g)));
        }

        for c in content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .order_by_asc(content::Column::ContentId)
            .all(self.conn)
            .await?
        {
            let references = self.load_references(c.content_id).await?;
            entities.push(ImportEntity::Content {
                content_id: c.content_id,
                content_type: c.content_type,
                content: c.content,
                content_hash: parse_hash(&c.content_hash)?,
                canonical_hash: c.canonical_hash.as_deref().map(parse_hash).transpose()?,
                references,
            });
        }

        for v in version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .order_by_asc(version::Column::GlobalId)
            .all(self.conn)
            .await?
        {
            let artifact = self.require_artifact(&v.group_id, &v.artifact_id).await?;
            entities.push(ImportEntity::Version {
                group_id: v.group_id,
                artifact_id: v.artifact_id,
                artifact_type: artifact.artifact_type,
                version: v.version,
                version_ordinal: v.version_ordinal,
                global_id: v.global_id,
                content_id: v.content_id,
                state: v.state,
                name: v.name,
                description: v.description,
                owner: v.owner,
                labels: labels_parse(v.labels.as_deref()),
                created_on: v.created_on,
            });
        }

        for (rule_type, configuration) in self.list_global_rules().await? {
            entities.push(ImportEntity::GlobalRule {
                rule_type,
                configuration,
            });
        }

        for r in artifact_rule::Entity::find()
            .filter(artifact_rule::Column::TenantId.eq(self.tenant()))
            .all(self.conn)
            .await?
        {
            entities.push(ImportEntity::ArtifactRule {
                group_id: r.group_id,
                artifact_id: r.artifact_id,
                rule_type: r.rule_type,
                configuration: r.configuration,
            });
        }

        for c in comment::Entity::find()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .order_by_asc(comment::Column::CommentId)
            .all(self.conn)
            .await?
        {
            entities.push(ImportEntity::Comment {
                comment_id: c.comment_id,
                global_id: c.global_id,
                owner: c.owner,
                created_on: c.created_on,
                value: c.value,
            });
        }

        Ok(entities)
    }

    /// Remove every row belonging to the tenant.
    pub async fn delete_all_user_data(&self) -> Result<(), CoreError> {
        macro_rules! wipe {
            ($entity:ident) => {
                $entity::Entity::delete_many()
                    .filter($entity::Column::TenantId.eq(self.tenant()))
                    .exec(self.conn)
                    .await?;
            };
        }
        wipe!(comment);
        wipe!(markdown);
        wipe!(content_reference);
        wipe!(version);
        wipe!(content);
        wipe!(artifact_rule);
        wipe!(global_rule);
        wipe!(artifact);
        wipe!(group);
        wipe!(role_mapping);
        wipe!(download);
        wipe!(config_property);
        wipe!(sequence);
        Ok(())
    }
}

// ----- model/DTO conversion helpers ---------------------------------------

pub(crate) fn labels_json(labels: &Labels) -> Option<String> {
    if labels.is_empty() {
        None
    } else {
        serde_json::to_string(labels).ok()
    }
}

pub(crate) fn labels_parse(raw: Option<&str>) -> Labels {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

pub(crate) fn parse_hash(raw: &str) -> Result<common::ContentHash, CoreError> {
    common::ContentHash::from_hex(raw)
        .map_err(|e| CoreError::fatal_caused("corrupt content hash column", e))
}

pub(crate) fn group_to_dto(model: group::Model) -> GroupMetaData {
    GroupMetaData {
        group_id: model.group_id,
        description: model.description,
        owner: model.owner,
        labels: labels_parse(model.labels.as_deref()),
        created_on: model.created_on,
        modified_on: model.modified_on,
    }
}

fn config_to_dto(model: config_property::Model) -> ConfigProperty {
    ConfigProperty {
        name: model.name,
        value: model.value,
        modified_on: model.modified_on,
    }
}
