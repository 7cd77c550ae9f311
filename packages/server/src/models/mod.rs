pub mod admin;
pub mod artifact;
pub mod group;

use serde::{Deserialize, Serialize};

/// Common pagination envelope for search results.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub count: u64,
}

/// Common search/pagination query parameters.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    /// Exact group match.
    pub group: Option<String>,
    /// Case-insensitive substring match on the description.
    pub description: Option<String>,
    /// Exact owner match.
    pub owner: Option<String>,
    pub global_id: Option<i64>,
    pub content_id: Option<i64>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// One of: name, createdOn, groupId, artifactId, version, globalId.
    pub order_by: Option<String>,
    /// "asc" or "desc".
    pub order: Option<String>,
}

impl SearchQuery {
    pub fn filters(&self) -> Vec<common::dto::SearchFilter> {
        use common::dto::SearchFilter;
        let mut filters = Vec::new();
        if let Some(name) = &self.name {
            filters.push(SearchFilter::Name(name.clone()));
        }
        if let Some(group) = &self.group {
            filters.push(SearchFilter::Group(group.clone()));
        }
        if let Some(description) = &self.description {
            filters.push(SearchFilter::Description(description.clone()));
        }
        if let Some(owner) = &self.owner {
            filters.push(SearchFilter::Owner(owner.clone()));
        }
        if let Some(global_id) = self.global_id {
            filters.push(SearchFilter::GlobalId(global_id));
        }
        if let Some(content_id) = self.content_id {
            filters.push(SearchFilter::ContentId(content_id));
        }
        filters
    }

    pub fn order_by(&self) -> Result<common::dto::OrderBy, String> {
        use common::dto::OrderBy;
        match self.order_by.as_deref() {
            None | Some("name") => Ok(OrderBy::Name),
            Some("createdOn") => Ok(OrderBy::CreatedOn),
            Some("groupId") => Ok(OrderBy::GroupId),
            Some("artifactId") => Ok(OrderBy::ArtifactId),
            Some("version") => Ok(OrderBy::Version),
            Some("globalId") => Ok(OrderBy::GlobalId),
            Some(other) => Err(format!(
                "order_by must be one of: name, createdOn, groupId, artifactId, version, globalId (got '{other}')"
            )),
        }
    }

    pub fn order(&self) -> Result<common::dto::OrderDirection, String> {
        use common::dto::OrderDirection;
        match self.order.as_deref() {
            None | Some("asc") => Ok(OrderDirection::Asc),
            Some("desc") => Ok(OrderDirection::Desc),
            Some(other) => Err(format!("order must be 'asc' or 'desc' (got '{other}')")),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 500)
    }
}
