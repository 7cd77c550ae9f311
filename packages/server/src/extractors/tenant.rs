use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::TenantId;

use crate::error::AppError;

/// Header naming the tenant for the request. Absent means the default
/// tenant; actual tenant authentication happens upstream.
pub const TENANT_HEADER: &str = "x-registry-tenant-id";

/// Extracts the request's tenant.
pub struct Tenant(pub TenantId);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(TENANT_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| AppError::Validation("invalid tenant header".into()))?;
                Ok(Tenant(TenantId::new(raw)))
            }
            None => Ok(Tenant(TenantId::default())),
        }
    }
}
