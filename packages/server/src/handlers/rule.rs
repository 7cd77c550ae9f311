use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::RuleType;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::tenant::Tenant;
use crate::models::admin::{CreateRuleRequest, RuleResponse, UpdateRuleRequest};
use crate::state::AppState;

fn parse_rule_type(raw: &str) -> Result<RuleType, AppError> {
    raw.parse::<RuleType>().map_err(AppError::Validation)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Rules",
    operation_id = "createGlobalRule",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Global rule created", body = RuleResponse),
        (status = 409, description = "Rule already exists (ALREADY_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn create_global_rule(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .create_global_rule(&tenant, payload.rule_type, &payload.configuration)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RuleResponse {
            rule_type: payload.rule_type,
            configuration: payload.configuration,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Rules",
    operation_id = "listGlobalRules",
    responses((status = 200, description = "All global rules", body = [RuleResponse])),
)]
#[instrument(skip(state, tenant))]
pub async fn list_global_rules(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<RuleResponse>>, AppError> {
    let rules = state.store.list_global_rules(&tenant).await?;
    Ok(Json(
        rules
            .into_iter()
            .map(|(rule_type, configuration)| RuleResponse {
                rule_type,
                configuration,
            })
            .collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/{rule_type}",
    tag = "Rules",
    operation_id = "updateGlobalRule",
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, description = "Global rule updated", body = RuleResponse),
        (status = 404, description = "Rule not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn update_global_rule(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(rule_type): Path<String>,
    Json(payload): Json<UpdateRuleRequest>,
) -> Result<Json<RuleResponse>, AppError> {
    let rule_type = parse_rule_type(&rule_type)?;
    state
        .store
        .update_global_rule(&tenant, rule_type, &payload.configuration)
        .await?;
    Ok(Json(RuleResponse {
        rule_type,
        configuration: payload.configuration,
    }))
}

#[utoipa::path(
    delete,
    path = "/{rule_type}",
    tag = "Rules",
    operation_id = "deleteGlobalRule",
    responses(
        (status = 204, description = "Global rule deleted"),
        (status = 404, description = "Rule not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_global_rule(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path(rule_type): Path<String>,
) -> Result<StatusCode, AppError> {
    let rule_type = parse_rule_type(&rule_type)?;
    state.store.delete_global_rule(&tenant, rule_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{artifact_id}/rules",
    tag = "Rules",
    operation_id = "createArtifactRule",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Artifact rule created", body = RuleResponse),
        (status = 404, description = "Artifact not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Rule already exists (ALREADY_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant, payload))]
pub async fn create_artifact_rule(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .create_artifact_rule(
            &tenant,
            &group_id,
            &artifact_id,
            payload.rule_type,
            &payload.configuration,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RuleResponse {
            rule_type: payload.rule_type,
            configuration: payload.configuration,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{artifact_id}/rules",
    tag = "Rules",
    operation_id = "listArtifactRules",
    responses(
        (status = 200, description = "Rules configured on the artifact", body = [RuleResponse]),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn list_artifact_rules(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id)): Path<(String, String)>,
) -> Result<Json<Vec<RuleResponse>>, AppError> {
    let rules = state
        .store
        .list_artifact_rules(&tenant, &group_id, &artifact_id)
        .await?;
    Ok(Json(
        rules
            .into_iter()
            .map(|(rule_type, configuration)| RuleResponse {
                rule_type,
                configuration,
            })
            .collect(),
    ))
}

#[utoipa::path(
    delete,
    path = "/{artifact_id}/rules/{rule_type}",
    tag = "Rules",
    operation_id = "deleteArtifactRule",
    responses(
        (status = 204, description = "Artifact rule deleted"),
        (status = 404, description = "Rule not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, tenant))]
pub async fn delete_artifact_rule(
    Tenant(tenant): Tenant,
    State(state): State<AppState>,
    Path((group_id, artifact_id, rule_type)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let rule_type = parse_rule_type(&rule_type)?;
    state
        .store
        .delete_artifact_rule(&tenant, &group_id, &artifact_id, rule_type)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
