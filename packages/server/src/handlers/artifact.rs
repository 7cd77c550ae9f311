use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use common::dto::{
    ContentWrapper, EditableArtifactMetaData, EditableVersionMetaData, Gav,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::tenant::Tenant;
use crate::models::artifact::{
    ArtifactResponse, CreateArtifactRequest, CreateArtifactResponse, CreateVersionRequest,
    UpdateStateRequest, VersionListResponse, VersionResponse,
};
use crate::models::{Paged, SearchQuery};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Artifacts",
    operation_id = "createArtifact",
    request_body = CreateArtifactRequest,
    responses(
        (status = 201, description = "Artifact created with its first version", body = CreateArtifactResponse),
        (status = 409, description = "Artifact exists or a rule rejected the content", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload), fields(artifact_id = %payload.artifact_id))]
pub async fn create_artifact(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(payload): Json<CreateArtifactRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.artifact_id.is_empty() {
        return Err(AppError::Validation("artifact_id must not be empty".into()));
    }
    let (artifact, version) = state
        .store
        .create_artifact(
            &tenant,
            &group_id,
            &payload.artifact_id,
            &payload.artifact_type,
            EditableArtifactMetaData {
                name: payload.name,
                description: payload.description,
                owner: None,
                labels: payload.labels,
            },
            payload.version,
            ContentWrapper {
                content_type: payload.content_type,
                content: payload.content.into_bytes(),
                references: payload.references,
            },
            EditableVersionMetaData::default(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateArtifactResponse {
            artifact: ArtifactResponse::from(artifact),
            version: VersionResponse::from(version),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{artifact_id}",
    tag = "Artifacts",
    operation_id = "getArtifact",
    responses(
        (status = 200, description = "Artifact metadata", body = ArtifactResponse),
        (status = 404, description = "Artifact not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn get_artifact(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
) -> Result<Json<ArtifactResponse>, AppError> {
    let meta = state
        .store
        .get_artifact_meta(&tenant, &group_id, &artifact_id)
        .await?;
    Ok(Json(ArtifactResponse::from(meta)))
}

#[utoipa::path(
    delete,
    path = "/{artifact_id}",
    tag = "Artifacts",
    operation_id = "deleteArtifact",
    responses(
        (status = 200, description = "Deleted version strings", body = VersionListResponse),
        (status = 404, description = "Artifact not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_artifact(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
) -> Result<Json<VersionListResponse>, AppError> {
    let versions = state
        .store
        .delete_artifact(&tenant, &group_id, &artifact_id)
        .await?;
    Ok(Json(VersionListResponse { versions }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Artifacts",
    operation_id = "searchArtifacts",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching artifacts", body = Paged<ArtifactResponse>),
    ),
)]
#[instrument(skip(state, tenant, query))]
pub async fn search_artifacts(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(mut query): Query<SearchQuery>,
) -> Result<Json<Paged<ArtifactResponse>>, AppError> {
    // The path group scopes the search.
    query.group = Some(group_id);
    let order_by = query.order_by().map_err(AppError::Validation)?;
    let order = query.order().map_err(AppError::Validation)?;
    let results = state
        .store
        .search_artifacts(
            &tenant,
            &query.filters(),
            order_by,
            order,
            query.offset(),
            query.limit(),
        )
        .await?;
    Ok(Json(Paged {
        items: results
            .artifacts
            .into_iter()
            .map(ArtifactResponse::from)
            .collect(),
        count: results.count,
    }))
}

#[utoipa::path(
    post,
    path = "/{artifact_id}/versions",
    tag = "Versions",
    operation_id = "createVersion",
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = VersionResponse),
        (status = 404, description = "Artifact not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Version exists or a rule rejected the content", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn create_version(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
    Json(payload): Json<CreateVersionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let meta = state
        .store
        .create_version(
            &tenant,
            &group_id,
            &artifact_id,
            payload.version,
            ContentWrapper {
                content_type: payload.content_type,
                content: payload.content.into_bytes(),
                references: payload.references,
            },
            EditableVersionMetaData {
                name: payload.name,
                description: payload.description,
                labels: None,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(VersionResponse::from(meta))))
}

#[utoipa::path(
    get,
    path = "/{artifact_id}/versions",
    tag = "Versions",
    operation_id = "listVersions",
    responses(
        (status = 200, description = "Version strings in ordinal order", body = VersionListResponse),
        (status = 404, description = "Artifact not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn list_versions(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
) -> Result<Json<VersionListResponse>, AppError> {
    let versions = state
        .store
        .list_versions(&tenant, &group_id, &artifact_id)
        .await?;
    Ok(Json(VersionListResponse { versions }))
}

#[utoipa::path(
    get,
    path = "/{artifact_id}/versions/{version}",
    tag = "Versions",
    operation_id = "getVersionMeta",
    responses(
        (status = 200, description = "Version metadata", body = VersionResponse),
        (status = 404, description = "Version not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn get_version_meta(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id, version)): Path<(String, String, String)>,
) -> Result<Json<VersionResponse>, AppError> {
    let meta = state
        .store
        .get_version_meta(&tenant, &Gav::new(group_id, artifact_id, version))
        .await?;
    Ok(Json(VersionResponse::from(meta)))
}

#[utoipa::path(
    get,
    path = "/{artifact_id}/versions/{version}/content",
    tag = "Versions",
    operation_id = "getVersionContent",
    responses(
        (status = 200, description = "Raw content bytes"),
        (status = 404, description = "Version not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn get_version_content(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id, version)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let stored = state
        .store
        .get_version_content(&tenant, &Gav::new(group_id, artifact_id, version))
        .await?;
    let content_type = stored
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], stored.content))
}

#[utoipa::path(
    put,
    path = "/{artifact_id}/versions/{version}/state",
    tag = "Versions",
    operation_id = "updateVersionState",
    request_body = UpdateStateRequest,
    responses(
        (status = 204, description = "State updated"),
        (status = 404, description = "Version not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Transition rejected (INVALID_STATE_TRANSITION, CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn update_version_state(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id, version)): Path<(String, String, String)>,
    Json(payload): Json<UpdateStateRequest>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .update_version_state(
            &tenant,
            Gav::new(group_id, artifact_id, version),
            payload.state,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{artifact_id}/versions/{version}",
    tag = "Versions",
    operation_id = "deleteVersion",
    responses(
        (status = 204, description = "Version deleted"),
        (status = 404, description = "Version not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Last ENABLED version cannot be deleted (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_version(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id, version)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete_version(&tenant, Gav::new(group_id, artifact_id, version))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
