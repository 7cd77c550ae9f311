use chrono::{DateTime, Utc};
use common::dto::{ConfigProperty, RoleMapping};
use common::RuleType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRuleRequest {
    pub rule_type: RuleType,
    pub configuration: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRuleRequest {
    pub configuration: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RuleResponse {
    pub rule_type: RuleType,
    pub configuration: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetConfigPropertyRequest {
    pub value: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ConfigPropertyResponse {
    pub name: String,
    pub value: String,
    pub modified_on: DateTime<Utc>,
}

impl From<ConfigProperty> for ConfigPropertyResponse {
    fn from(p: ConfigProperty) -> Self {
        Self {
            name: p.name,
            value: p.value,
            modified_on: p.modified_on,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRoleMappingRequest {
    pub principal_id: String,
    pub role: String,
    pub principal_name: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleMappingRequest {
    pub role: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RoleMappingResponse {
    pub principal_id: String,
    pub role: String,
    pub principal_name: Option<String>,
}

impl From<RoleMapping> for RoleMappingResponse {
    fn from(m: RoleMapping) -> Self {
        Self {
            principal_id: m.principal_id,
            role: m.role,
            principal_name: m.principal_name,
        }
    }
}
