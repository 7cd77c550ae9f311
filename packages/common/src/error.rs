use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of stored entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Group,
    Artifact,
    Version,
    Content,
    Rule,
    Comment,
    RoleMapping,
    Download,
    Markdown,
    ConfigProperty,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Artifact => "artifact",
            Self::Version => "version",
            Self::Content => "content",
            Self::Rule => "rule",
            Self::Comment => "comment",
            Self::RoleMapping => "role mapping",
            Self::Download => "download",
            Self::Markdown => "markdown",
            Self::ConfigProperty => "config property",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error channel of the registry core.
///
/// Every failure that crosses the coordinator boundary is one of these kinds,
/// so the type is serializable: a sink on the originating node completes the
/// caller's slot with exactly what the apply produced.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoreError {
    #[error("{entity} not found: {coordinates}")]
    NotFound {
        entity: EntityKind,
        coordinates: String,
    },

    #[error("{entity} already exists: {coordinates}")]
    AlreadyExists {
        entity: EntityKind,
        coordinates: String,
    },

    #[error("invalid version state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// A configured rule rejected the content. Raised before submission, so
    /// rule violations never enter the journal.
    #[error("rule {rule} violated: {message}")]
    RuleViolation { rule: String, message: String },

    #[error("invalid reference: {message}")]
    ReferenceInvalid { message: String },

    /// The coordinator wait expired. The outcome of the mutation is unknown;
    /// callers must resolve via a read.
    #[error("timed out waiting for the mutation to apply")]
    Timeout,

    #[error("storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },

    /// A concurrent mutation made this message's precondition false by the
    /// time it applied.
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("node is shutting down")]
    Shutdown,

    /// Encoding or invariant violation. Stops the consumer loop and flips the
    /// node out of `alive`.
    #[error("fatal: {message}")]
    Fatal {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cause: Option<String>,
    },
}

impl CoreError {
    pub fn not_found(entity: EntityKind, coordinates: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            coordinates: coordinates.into(),
        }
    }

    pub fn already_exists(entity: EntityKind, coordinates: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            coordinates: coordinates.into(),
        }
    }

    pub fn rule_violation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleViolation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn reference_invalid(message: impl Into<String>) -> Self {
        Self::ReferenceInvalid {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl fmt::Display) -> Self {
        Self::StorageUnavailable {
            message: message.to_string(),
            cause: None,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
            cause: None,
        }
    }

    pub fn fatal_caused(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::Fatal {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// True for errors that must abort the consumer loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// True for the apply errors that are expected during bootstrap replay of
    /// an already-applied journal suffix.
    pub fn is_replay_benign(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::NotFound { .. })
    }
}

#[cfg(feature = "sea-orm")]
impl From<sea_orm::DbErr> for CoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        CoreError::StorageUnavailable {
            message: "database error".into(),
            cause: Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip_keeps_kind() {
        let err = CoreError::already_exists(EntityKind::Artifact, "g1/a1");
        let json = serde_json::to_string(&err).unwrap();
        let parsed: CoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, parsed);
        assert!(json.contains("\"kind\":\"already_exists\""));
    }

    #[test]
    fn replay_benign_covers_exactly_replay_errors() {
        assert!(CoreError::already_exists(EntityKind::Group, "g1").is_replay_benign());
        assert!(CoreError::not_found(EntityKind::Version, "g1/a1/1").is_replay_benign());
        assert!(!CoreError::conflict("x").is_replay_benign());
        assert!(!CoreError::Timeout.is_replay_benign());
    }

    #[test]
    fn fatal_detection() {
        assert!(CoreError::fatal("bad envelope").is_fatal());
        assert!(!CoreError::unavailable("db down").is_fatal());
    }
}
