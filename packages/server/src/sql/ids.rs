use common::CoreError;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::SqlStore;
use crate::entity::{comment, content, sequence, version};

pub const GLOBAL_ID_SEQ: &str = "global_id";
pub const CONTENT_ID_SEQ: &str = "content_id";
pub const COMMENT_ID_SEQ: &str = "comment_id";

/// The id allocator. Only ever invoked from inside the sink's apply
/// transaction, so allocation order equals journal order and no two nodes can
/// disagree on the next value.
impl<'a, C: ConnectionTrait> SqlStore<'a, C> {
    pub async fn next_global_id(&self) -> Result<i64, CoreError> {
        self.next_id(GLOBAL_ID_SEQ).await
    }

    pub async fn next_content_id(&self) -> Result<i64, CoreError> {
        self.next_id(CONTENT_ID_SEQ).await
    }

    pub async fn next_comment_id(&self) -> Result<i64, CoreError> {
        self.next_id(COMMENT_ID_SEQ).await
    }

    /// Set the sequence so the next allocation is `max(existing) + 1`. Used
    /// during import.
    pub async fn reset_global_id(&self) -> Result<(), CoreError> {
        let max = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .order_by_desc(version::Column::GlobalId)
            .limit(1)
            .one(self.conn())
            .await?
            .map(|v| v.global_id)
            .unwrap_or(0);
        self.set_sequence(GLOBAL_ID_SEQ, max).await
    }

    pub async fn reset_content_id(&self) -> Result<(), CoreError> {
        let max = content::Entity::find()
            .filter(content::Column::TenantId.eq(self.tenant()))
            .order_by_desc(content::Column::ContentId)
            .limit(1)
            .one(self.conn())
            .await?
            .map(|c| c.content_id)
            .unwrap_or(0);
        self.set_sequence(CONTENT_ID_SEQ, max).await
    }

    pub async fn reset_comment_id(&self) -> Result<(), CoreError> {
        let max = comment::Entity::find()
            .filter(comment::Column::TenantId.eq(self.tenant()))
            .order_by_desc(comment::Column::CommentId)
            .limit(1)
            .one(self.conn())
            .await?
            .map(|c| c.comment_id)
            .unwrap_or(0);
        self.set_sequence(COMMENT_ID_SEQ, max).await
    }

    /// Advance the sequence past an explicitly imported id, so preserved ids
    /// can never collide with later allocations.
    pub(crate) async fn advance_global_id(&self, id: i64) -> Result<(), CoreError> {
        self.advance_past(GLOBAL_ID_SEQ, id).await
    }

    pub(crate) async fn advance_content_id(&self, id: i64) -> Result<(), CoreError> {
        self.advance_past(CONTENT_ID_SEQ, id).await
    }

    pub(crate) async fn advance_comment_id(&self, id: i64) -> Result<(), CoreError> {
        self.advance_past(COMMENT_ID_SEQ, id).await
    }

    async fn next_id(&self, name: &str) -> Result<i64, CoreError> {
        match self.find_sequence(name).await? {
            Some(row) => {
                let next = row.value + 1;
                let mut active: sequence::ActiveModel = row.into();
                active.value = Set(next);
                active.update(self.conn()).await?;
                Ok(next)
            }
            None => {
                sequence::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    tenant_id: Set(self.tenant().to_string()),
                    name: Set(name.to_string()),
                    value: Set(1),
                }
                .insert(self.conn())
                .await?;
                Ok(1)
            }
        }
    }

    async fn advance_past(&self, name: &str, id: i64) -> Result<(), CoreError> {
        match self.find_sequence(name).await? {
            Some(row) if row.value >= id => Ok(()),
            Some(row) => {
                let mut active: sequence::ActiveModel = row.into();
                active.value = Set(id);
                active.update(self.conn()).await?;
                Ok(())
            }
            None => self.set_sequence(name, id).await,
        }
    }

    async fn set_sequence(&self, name: &str, value: i64) -> Result<(), CoreError> {
        match self.find_sequence(name).await? {
            Some(row) => {
                sequence::Entity::update_many()
                    .col_expr(sequence::Column::Value, Expr::value(value))
                    .filter(sequence::Column::Id.eq(row.id))
                    .exec(self.conn())
                    .await?;
                Ok(())
            }
            None => {
                sequence::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    tenant_id: Set(self.tenant().to_string()),
                    name: Set(name.to_string()),
                    value: Set(value),
                }
                .insert(self.conn())
                .await?;
                Ok(())
            }
        }
    }

    async fn find_sequence(&self, name: &str) -> Result<Option<sequence::Model>, CoreError> {
        Ok(sequence::Entity::find()
            .filter(sequence::Column::TenantId.eq(self.tenant()))
            .filter(sequence::Column::Name.eq(name))
            .one(self.conn())
            .await?)
    }
}
