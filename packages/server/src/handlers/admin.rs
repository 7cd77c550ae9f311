use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::tenant::Tenant;
use crate::models::admin::{
    ConfigPropertyResponse, CreateRoleMappingRequest, RoleMappingResponse,
    SetConfigPropertyRequest, UpdateRoleMappingRequest,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/config",
    tag = "Admin",
    operation_id = "listConfigProperties",
    responses((status = 200, description = "All dynamic config properties", body = [ConfigPropertyResponse])),
)]
#[instrument(skip(state, tenant))]
pub async fn list_config_properties(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConfigPropertyResponse>>, AppError> {
    let properties = state.store.list_config_properties(&tenant).await?;
    Ok(Json(
        properties.into_iter().map(ConfigPropertyResponse::from).collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/config/{name}",
    tag = "Admin",
    operation_id = "setConfigProperty",
    request_body = SetConfigPropertyRequest,
    responses((status = 204, description = "Property stored")),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn set_config_property(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<SetConfigPropertyRequest>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .set_config_property(&tenant, &name, &payload.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/config/{name}",
    tag = "Admin",
    operation_id = "getConfigProperty",
    responses(
        (status = 200, description = "Property value", body = ConfigPropertyResponse),
        (status = 404, description = "Property not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn get_config_property(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ConfigPropertyResponse>, AppError> {
    let property = state.store.get_config_property(&tenant, &name).await?;
    Ok(Json(ConfigPropertyResponse::from(property)))
}

#[utoipa::path(
    delete,
    path = "/config/{name}",
    tag = "Admin",
    operation_id = "deleteConfigProperty",
    responses(
        (status = 204, description = "Property deleted"),
        (status = 404, description = "Property not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_config_property(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_config_property(&tenant, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/roles",
    tag = "Admin",
    operation_id = "listRoleMappings",
    responses((status = 200, description = "All role mappings", body = [RoleMappingResponse])),
)]
#[instrument(skip(state, tenant))]
pub async fn list_role_mappings(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleMappingResponse>>, AppError> {
    let mappings = state.store.list_role_mappings(&tenant).await?;
    Ok(Json(
        mappings.into_iter().map(RoleMappingResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "Admin",
    operation_id = "createRoleMapping",
    request_body = CreateRoleMappingRequest,
    responses(
        (status = 201, description = "Role mapping created", body = RoleMappingResponse),
        (status = 409, description = "Mapping already exists (ALREADY_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload), fields(principal_id = %payload.principal_id))]
pub async fn create_role_mapping(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleMappingRequest>,
) -> Result<(StatusCode, Json<RoleMappingResponse>), AppError> {
    let mapping = common::dto::RoleMapping {
        principal_id: payload.principal_id,
        role: payload.role,
        principal_name: payload.principal_name,
    };
    state.store.create_role_mapping(&tenant, mapping.clone()).await?;
    Ok((StatusCode::CREATED, Json(RoleMappingResponse::from(mapping))))
}

#[utoipa::path(
    put,
    path = "/roles/{principal_id}",
    tag = "Admin",
    operation_id = "updateRoleMapping",
    request_body = UpdateRoleMappingRequest,
    responses(
        (status = 204, description = "Role updated"),
        (status = 404, description = "Mapping not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn update_role_mapping(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(principal_id): Path<String>,
    Json(payload): Json<UpdateRoleMappingRequest>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .update_role_mapping(&tenant, &principal_id, &payload.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/roles/{principal_id}",
    tag = "Admin",
    operation_id = "deleteRoleMapping",
    responses(
        (status = 204, description = "Mapping deleted"),
        (status = 404, description = "Mapping not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_role_mapping(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(principal_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_role_mapping(&tenant, &principal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
