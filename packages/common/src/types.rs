#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a configurable rule. The rule's configuration value is an opaque
/// string interpreted by its evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleType {
    /// Content well-formedness (e.g. `SYNTAX_ONLY`).
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "VALIDITY"))]
    Validity,
    /// Compatibility against prior versions.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPATIBILITY"))]
    Compatibility,
    /// Reference well-formedness.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INTEGRITY"))]
    Integrity,
}

impl RuleType {
    pub const ALL: &'static [RuleType] = &[Self::Validity, Self::Compatibility, Self::Integrity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validity => "VALIDITY",
            Self::Compatibility => "COMPATIBILITY",
            Self::Integrity => "INTEGRITY",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALIDITY" => Ok(Self::Validity),
            "COMPATIBILITY" => Ok(Self::Compatibility),
            "INTEGRITY" => Ok(Self::Integrity),
            _ => Err(format!(
                "Invalid rule type '{s}'. Valid values: VALIDITY, COMPATIBILITY, INTEGRITY"
            )),
        }
    }
}

/// Tenant discriminator. Every stored row and every journal key is scoped by
/// one of these; `TenantId::default()` is the single-tenant value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

pub const DEFAULT_TENANT: &str = "_";

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            Self(DEFAULT_TENANT.to_string())
        } else {
            Self(id)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self(DEFAULT_TENANT.to_string())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider of the tenant for the current request.
pub trait TenantContext: Send + Sync {
    fn tenant_id(&self) -> TenantId;
}

/// Fixed-tenant provider, the single-tenant deployment default.
pub struct StaticTenant(pub TenantId);

impl TenantContext for StaticTenant {
    fn tenant_id(&self) -> TenantId {
        self.0.clone()
    }
}

/// Canonical label shape. Keys with a `None` value are bare labels; keys with
/// `Some` are key/value properties. Only this shape is ever persisted.
pub type Labels = BTreeMap<String, Option<String>>;

/// Canonicalize the two label shapes accepted on ingress (a bare name list
/// and a key/value property map) into one map. Properties win on key clash.
pub fn canonical_labels(
    names: Option<Vec<String>>,
    properties: Option<BTreeMap<String, String>>,
) -> Labels {
    let mut labels: Labels = BTreeMap::new();
    for name in names.into_iter().flatten() {
        if !name.is_empty() {
            labels.insert(name, None);
        }
    }
    for (k, v) in properties.into_iter().flatten() {
        if !k.is_empty() {
            labels.insert(k, Some(v));
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_type_round_trip() {
        for rule in RuleType::ALL {
            assert_eq!(rule.as_str().parse::<RuleType>().unwrap(), *rule);
        }
        assert!("validity".parse::<RuleType>().is_err());
    }

    #[test]
    fn tenant_empty_maps_to_default() {
        assert_eq!(TenantId::new("").as_str(), DEFAULT_TENANT);
        assert_eq!(TenantId::new("acme").as_str(), "acme");
    }

    #[test]
    fn labels_canonicalize_both_shapes() {
        let labels = canonical_labels(
            Some(vec!["beta".into(), "critical".into()]),
            Some(BTreeMap::from([("env".to_string(), "prod".to_string())])),
        );
        assert_eq!(labels.get("beta"), Some(&None));
        assert_eq!(labels.get("env"), Some(&Some("prod".to_string())));
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn labels_properties_win_on_clash() {
        let labels = canonical_labels(
            Some(vec!["env".into()]),
            Some(BTreeMap::from([("env".to_string(), "prod".to_string())])),
        );
        assert_eq!(labels.get("env"), Some(&Some("prod".to_string())));
    }
}
