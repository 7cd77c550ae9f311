use common::dto::{
    ArtifactSearchResults, GroupSearchResults, OrderBy, OrderDirection, SearchFilter,
    VersionSearchResults,
};
use common::CoreError;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Condition, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::artifacts::{artifact_to_dto, version_to_dto};
use super::{group_to_dto, SqlStore};
use crate::entity::{artifact, group, version};

/// Escape LIKE wildcards so user terms match literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring match on a column.
fn ci_contains<Col: ColumnTrait>(col: Col, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col)))
        .like(LikeExpr::new(format!("%{}%", escape_like(term).to_lowercase())).escape('\\'))
}

/// Case-folded ordering key for a text column.
fn lower<Col: ColumnTrait>(col: Col) -> SimpleExpr {
    Func::lower(Expr::col(col)).into()
}

/// Label-key (and optionally value) match against the canonical JSON text
/// form of the label map.
fn label_pattern<Col: ColumnTrait>(col: Col, key: &str, value: Option<&str>) -> SimpleExpr {
    let pattern = match value {
        Some(value) => format!(
            "%\"{}\":\"{}\"%",
            escape_like(key),
            escape_like(value)
        ),
        None => format!("%\"{}\":%", escape_like(key)),
    };
    Expr::col(col).like(LikeExpr::new(pattern).escape('\\'))
}

fn order(dir: OrderDirection) -> Order {
    match dir {
        OrderDirection::Asc => Order::Asc,
        OrderDirection::Desc => Order::Desc,
    }
}

impl<'a, C: ConnectionTrait> SqlStore<'a, C> {
    pub async fn search_artifacts(
        &self,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<ArtifactSearchResults, CoreError> {
        let mut select = artifact::Entity::find().filter(artifact::Column::TenantId.eq(self.tenant()));

        for filter in filters {
            select = match filter {
                SearchFilter::Name(term) => select.filter(
                    Condition::any()
                        .add(ci_contains(artifact::Column::Name, term))
                        .add(ci_contains(artifact::Column::ArtifactId, term)),
                ),
                SearchFilter::Group(group_id) => {
                    select.filter(artifact::Column::GroupId.eq(group_id))
                }
                SearchFilter::Description(term) => {
                    select.filter(ci_contains(artifact::Column::Description, term))
                }
                SearchFilter::Label { key, value } => select.filter(label_pattern(
                    artifact::Column::Labels,
                    key,
                    value.as_deref(),
                )),
                SearchFilter::Property { key, value } => {
                    select.filter(label_pattern(artifact::Column::Labels, key, Some(value)))
                }
                SearchFilter::Owner(owner) => select.filter(artifact::Column::Owner.eq(owner)),
                SearchFilter::GlobalId(global_id) => {
                    let Some(condition) = self.artifact_coords_condition(
                        version::Column::GlobalId.eq(*global_id),
                    )
                    .await?
                    else {
                        return Ok(ArtifactSearchResults {
                            artifacts: Vec::new(),
                            count: 0,
                        });
                    };
                    select.filter(condition)
                }
                SearchFilter::ContentId(content_id) => {
                    let Some(condition) = self.artifact_coords_condition(
                        version::Column::ContentId.eq(*content_id),
                    )
                    .await?
                    else {
                        return Ok(ArtifactSearchResults {
                            artifacts: Vec::new(),
                            count: 0,
                        });
                    };
                    select.filter(condition)
                }
            };
        }

        let count = select.clone().count(self.conn()).await?;

        select = match order_by {
            OrderBy::Name => select.order_by(lower(artifact::Column::Name), order(dir)),
            OrderBy::CreatedOn => select.order_by(artifact::Column::CreatedOn, order(dir)),
            OrderBy::GroupId => select.order_by(lower(artifact::Column::GroupId), order(dir)),
            // Version and global id do not order artifacts; fall back to id.
            OrderBy::ArtifactId | OrderBy::Version | OrderBy::GlobalId => select.order_by(lower(artifact::Column::ArtifactId), order(dir)),
        };
        select = select.order_by_asc(artifact::Column::ArtifactId);

        let artifacts = select
            .offset(offset)
            .limit(limit)
            .all(self.conn())
            .await?;

        Ok(ArtifactSearchResults {
            artifacts: artifacts.into_iter().map(artifact_to_dto).collect(),
            count,
        })
    }

    pub async fn search_groups(
        &self,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<GroupSearchResults, CoreError> {
        let mut select = group::Entity::find().filter(group::Column::TenantId.eq(self.tenant()));

        for filter in filters {
            select = match filter {
                SearchFilter::Name(term) => {
                    select.filter(ci_contains(group::Column::GroupId, term))
                }
                SearchFilter::Group(group_id) => select.filter(group::Column::GroupId.eq(group_id)),
                SearchFilter::Description(term) => {
                    select.filter(ci_contains(group::Column::Description, term))
                }
                SearchFilter::Label { key, value } => {
                    select.filter(label_pattern(group::Column::Labels, key, value.as_deref()))
                }
                SearchFilter::Property { key, value } => {
                    select.filter(label_pattern(group::Column::Labels, key, Some(value)))
                }
                SearchFilter::Owner(owner) => select.filter(group::Column::Owner.eq(owner)),
                // Version-level filters do not narrow groups.
                SearchFilter::GlobalId(_) | SearchFilter::ContentId(_) => select,
            };
        }

        let count = select.clone().count(self.conn()).await?;

        select = match order_by {
            OrderBy::CreatedOn => select.order_by(group::Column::CreatedOn, order(dir)),
            _ => select.order_by(lower(group::Column::GroupId), order(dir)),
        };
        select = select.order_by_asc(group::Column::GroupId);

        let groups = select.offset(offset).limit(limit).all(self.conn()).await?;

        Ok(GroupSearchResults {
            groups: groups.into_iter().map(group_to_dto).collect(),
            count,
        })
    }

    pub async fn search_versions(
        &self,
        filters: &[SearchFilter],
        order_by: OrderBy,
        dir: OrderDirection,
        offset: u64,
        limit: u64,
    ) -> Result<VersionSearchResults, CoreError> {
        let mut select = version::Entity::find().filter(version::Column::TenantId.eq(self.tenant()));

        for filter in filters {
            select = match filter {
                SearchFilter::Name(term) => select.filter(
                    Condition::any()
                        .add(ci_contains(version::Column::Name, term))
                        .add(ci_contains(version::Column::Version, term)),
                ),
                SearchFilter::Group(group_id) => {
                    select.filter(version::Column::GroupId.eq(group_id))
                }
                SearchFilter::Description(term) => {
                    select.filter(ci_contains(version::Column::Description, term))
                }
                SearchFilter::Label { key, value } => select.filter(label_pattern(
                    version::Column::Labels,
                    key,
                    value.as_deref(),
                )),
                SearchFilter::Property { key, value } => {
                    select.filter(label_pattern(version::Column::Labels, key, Some(value)))
                }
                SearchFilter::Owner(owner) => select.filter(version::Column::Owner.eq(owner)),
                SearchFilter::GlobalId(global_id) => {
                    select.filter(version::Column::GlobalId.eq(*global_id))
                }
                SearchFilter::ContentId(content_id) => {
                    select.filter(version::Column::ContentId.eq(*content_id))
                }
            };
        }

        let count = select.clone().count(self.conn()).await?;

        select = match order_by {
            OrderBy::Name => select.order_by(lower(version::Column::Name), order(dir)),
            OrderBy::CreatedOn => select.order_by(version::Column::CreatedOn, order(dir)),
            OrderBy::GroupId => select.order_by(lower(version::Column::GroupId), order(dir)),
            OrderBy::ArtifactId => select.order_by(lower(version::Column::ArtifactId), order(dir)),
            OrderBy::Version => select.order_by(lower(version::Column::Version), order(dir)),
            OrderBy::GlobalId => select.order_by(version::Column::GlobalId, order(dir)),
        };
        select = select
            .order_by_asc(version::Column::ArtifactId)
            .order_by_asc(version::Column::Version);

        let versions = select.offset(offset).limit(limit).all(self.conn()).await?;

        Ok(VersionSearchResults {
            versions: versions.into_iter().map(version_to_dto).collect(),
            count,
        })
    }

    /// Narrow an artifact query to the coordinates of versions matching the
    /// given predicate. Returns `None` when nothing matches.
    async fn artifact_coords_condition(
        &self,
        predicate: SimpleExpr,
    ) -> Result<Option<Condition>, CoreError> {
        let versions = version::Entity::find()
            .filter(version::Column::TenantId.eq(self.tenant()))
            .filter(predicate)
            .all(self.conn())
            .await?;
        if versions.is_empty() {
            return Ok(None);
        }
        let mut condition = Condition::any();
        for v in versions {
            condition = condition.add(
                Condition::all()
                    .add(artifact::Column::GroupId.eq(v.group_id))
                    .add(artifact::Column::ArtifactId.eq(v.artifact_id)),
            );
        }
        Ok(Some(condition))
    }
}
