use std::collections::HashSet;

use common::dto::ContentWrapper;
use common::{CoreError, RuleType};

use super::RuleEvaluator;

/// Reference well-formedness: names must be present and unique, and every
/// reference must name its target artifact. Whether targets must *resolve* is
/// the store's strictness policy, enforced at apply time.
pub struct IntegrityRule;

impl RuleEvaluator for IntegrityRule {
    fn rule_type(&self) -> RuleType {
        RuleType::Integrity
    }

    fn evaluate(
        &self,
        configuration: &str,
        content: &ContentWrapper,
        _artifact_type: &str,
    ) -> Result<(), CoreError> {
        if configuration.eq_ignore_ascii_case("NONE") || configuration.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for reference in &content.references {
            if reference.artifact_id.is_empty() || reference.name.is_empty() {
                return Err(CoreError::rule_violation(
                    RuleType::Integrity.as_str(),
                    "references must carry an artifactId and a name",
                ));
            }
            if !seen.insert(reference.name.as_str()) {
                return Err(CoreError::rule_violation(
                    RuleType::Integrity.as_str(),
                    format!("duplicate reference name '{}'", reference.name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::dto::ArtifactReference;

    fn with_refs(references: Vec<ArtifactReference>) -> ContentWrapper {
        ContentWrapper {
            content_type: None,
            content: b"{}".to_vec(),
            references,
        }
    }

    fn reference(name: &str) -> ArtifactReference {
        ArtifactReference {
            group_id: Some("g1".into()),
            artifact_id: "dep".into(),
            version: Some("1".into()),
            name: name.into(),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let rule = IntegrityRule;
        let content = with_refs(vec![reference("a"), reference("a")]);
        assert!(rule.evaluate("FULL", &content, "AVRO").is_err());
    }

    #[test]
    fn distinct_names_pass() {
        let rule = IntegrityRule;
        let content = with_refs(vec![reference("a"), reference("b")]);
        assert!(rule.evaluate("FULL", &content, "AVRO").is_ok());
    }

    #[test]
    fn empty_artifact_id_is_rejected() {
        let rule = IntegrityRule;
        let mut bad = reference("a");
        bad.artifact_id = String::new();
        assert!(rule.evaluate("FULL", &with_refs(vec![bad]), "AVRO").is_err());
    }
}
