#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an artifact version.
///
/// Serialized (wire and database) as the uppercase name. When the `sea-orm`
/// feature is enabled the enum can be used directly in entity columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionState {
    /// Normal, servable version.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ENABLED"))]
    Enabled,
    /// Hidden from default reads but retained.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DISABLED"))]
    Disabled,
    /// Servable but flagged as superseded.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DEPRECATED"))]
    Deprecated,
}

impl VersionState {
    /// All states.
    pub const ALL: &'static [VersionState] = &[Self::Enabled, Self::Disabled, Self::Deprecated];

    /// Returns the uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Deprecated => "DEPRECATED",
        }
    }

    /// The transition table: `ENABLED ⇄ DISABLED`, `ENABLED → DEPRECATED`,
    /// `DEPRECATED → ENABLED`. A self-transition is always allowed.
    pub fn can_transition(from: VersionState, to: VersionState) -> bool {
        if from == to {
            return true;
        }
        matches!(
            (from, to),
            (Self::Enabled, Self::Disabled)
                | (Self::Disabled, Self::Enabled)
                | (Self::Enabled, Self::Deprecated)
                | (Self::Deprecated, Self::Enabled)
        )
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for VersionState {
    fn default() -> Self {
        Self::Enabled
    }
}

/// Error when parsing an invalid state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError {
    invalid: String,
}

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid version state '{}'. Valid values: {}",
            self.invalid,
            VersionState::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for VersionState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENABLED" => Ok(Self::Enabled),
            "DISABLED" => Ok(Self::Disabled),
            "DEPRECATED" => Ok(Self::Deprecated),
            _ => Err(ParseStateError {
                invalid: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_uppercase_names() {
        assert_eq!(
            serde_json::to_string(&VersionState::Deprecated).unwrap(),
            "\"DEPRECATED\""
        );
        let parsed: VersionState = serde_json::from_str("\"ENABLED\"").unwrap();
        assert_eq!(parsed, VersionState::Enabled);
    }

    #[test]
    fn from_str_round_trip() {
        for state in VersionState::ALL {
            assert_eq!(state.as_str().parse::<VersionState>().unwrap(), *state);
        }
        assert!("enabled".parse::<VersionState>().is_err());
    }

    #[test]
    fn transition_table() {
        use VersionState::*;
        assert!(VersionState::can_transition(Enabled, Disabled));
        assert!(VersionState::can_transition(Disabled, Enabled));
        assert!(VersionState::can_transition(Enabled, Deprecated));
        assert!(VersionState::can_transition(Deprecated, Enabled));
        // Undefined edges.
        assert!(!VersionState::can_transition(Disabled, Deprecated));
        assert!(!VersionState::can_transition(Deprecated, Disabled));
        // Self-transitions.
        assert!(VersionState::can_transition(Disabled, Disabled));
    }
}
