use common::dto::ContentWrapper;
use common::{CoreError, RuleType};

use super::RuleEvaluator;

/// Artifact types whose content is JSON text.
const JSON_TYPES: &[&str] = &["AVRO", "JSON", "OPENAPI", "ASYNCAPI"];

/// Syntactic well-formedness check. Configuration levels:
/// `NONE` (disabled), `SYNTAX_ONLY` and `FULL` (both parse the content for
/// JSON-family types; non-JSON types need external parsers and pass).
pub struct ValidityRule;

impl RuleEvaluator for ValidityRule {
    fn rule_type(&self) -> RuleType {
        RuleType::Validity
    }

    fn evaluate(
        &self,
        configuration: &str,
        content: &ContentWrapper,
        artifact_type: &str,
    ) -> Result<(), CoreError> {
        if configuration.eq_ignore_ascii_case("NONE") || configuration.is_empty() {
            return Ok(());
        }

        let json_family = JSON_TYPES.iter().any(|t| artifact_type.eq_ignore_ascii_case(t))
            || content
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.contains("json"));
        if !json_family {
            return Ok(());
        }

        if let Err(e) = serde_json::from_slice::<serde_json::Value>(&content.content) {
            return Err(CoreError::rule_violation(
                RuleType::Validity.as_str(),
                format!("content is not well-formed: {e}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(bytes: &[u8]) -> ContentWrapper {
        ContentWrapper {
            content_type: None,
            content: bytes.to_vec(),
            references: Vec::new(),
        }
    }

    #[test]
    fn syntax_only_rejects_malformed_json() {
        let rule = ValidityRule;
        assert!(rule
            .evaluate("SYNTAX_ONLY", &content(b"{\"This is not valid"), "AVRO")
            .is_err());
        assert!(rule
            .evaluate(
                "SYNTAX_ONLY",
                &content(br#"{"type":"record","name":"X","fields":[]}"#),
                "AVRO"
            )
            .is_ok());
    }

    #[test]
    fn none_level_is_disabled() {
        let rule = ValidityRule;
        assert!(rule
            .evaluate("NONE", &content(b"{\"This is not valid"), "JSON")
            .is_ok());
    }

    #[test]
    fn non_json_types_pass_without_a_parser() {
        let rule = ValidityRule;
        assert!(rule
            .evaluate("SYNTAX_ONLY", &content(b"syntax = \"proto3\";"), "PROTOBUF")
            .is_ok());
    }
}
