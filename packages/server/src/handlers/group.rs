use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::dto::EditableGroupMetaData;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::tenant::Tenant;
use crate::models::group::{CreateGroupRequest, GroupResponse, UpdateGroupRequest};
use crate::models::{Paged, SearchQuery};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Groups",
    operation_id = "createGroup",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 409, description = "Group already exists (ALREADY_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload), fields(group_id = %payload.group_id))]
pub async fn create_group(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.group_id.is_empty() {
        return Err(AppError::Validation("group_id must not be empty".into()));
    }
    state
        .store
        .create_group(
            &tenant,
            &payload.group_id,
            payload.description,
            payload.owner,
            payload.labels,
        )
        .await?;
    let group = state.store.get_group(&tenant, &payload.group_id).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

#[utoipa::path(
    get,
    path = "/{group_id}",
    tag = "Groups",
    operation_id = "getGroup",
    responses(
        (status = 200, description = "Group metadata", body = GroupResponse),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn get_group(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = state.store.get_group(&tenant, &group_id).await?;
    Ok(Json(GroupResponse::from(group)))
}

#[utoipa::path(
    put,
    path = "/{group_id}",
    tag = "Groups",
    operation_id = "updateGroup",
    request_body = UpdateGroupRequest,
    responses(
        (status = 204, description = "Group updated"),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn update_group(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdateGroupRequest>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .update_group(
            &tenant,
            &group_id,
            EditableGroupMetaData {
                description: payload.description,
                labels: payload.labels,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{group_id}",
    tag = "Groups",
    operation_id = "deleteGroup",
    responses(
        (status = 204, description = "Group and all artifacts deleted"),
        (status = 404, description = "Group not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_group(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_group(&tenant, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Groups",
    operation_id = "searchGroups",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching groups", body = Paged<GroupResponse>),
    ),
)]
#[instrument(skip(state, tenant, query))]
pub async fn search_groups(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paged<GroupResponse>>, AppError> {
    let order_by = query.order_by().map_err(AppError::Validation)?;
    let order = query.order().map_err(AppError::Validation)?;
    let results = state
        .store
        .search_groups(
            &tenant,
            &query.filters(),
            order_by,
            order,
            query.offset(),
            query.limit(),
        )
        .await?;
    Ok(Json(Paged {
        items: results.groups.into_iter().map(GroupResponse::from).collect(),
        count: results.count,
    }))
}
