mod integrity;
mod validity;

pub use integrity::IntegrityRule;
pub use validity::ValidityRule;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use common::dto::ContentWrapper;
use common::{CoreError, RuleType};

/// One configured rule evaluator. Evaluators run synchronously on the request
/// path, before a mutation is submitted, so violations never enter the
/// journal.
pub trait RuleEvaluator: Send + Sync {
    fn rule_type(&self) -> RuleType;

    fn evaluate(
        &self,
        configuration: &str,
        content: &ContentWrapper,
        artifact_type: &str,
    ) -> Result<(), CoreError>;
}

/// Compatibility checking needs content-type-aware parsers, which are
/// external collaborators; the default evaluator accepts everything and is
/// replaced by registering a real one.
struct PassThroughCompatibility;

impl RuleEvaluator for PassThroughCompatibility {
    fn rule_type(&self) -> RuleType {
        RuleType::Compatibility
    }

    fn evaluate(&self, _: &str, _: &ContentWrapper, _: &str) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Registry of evaluators keyed by rule type.
pub struct RuleRegistry {
    evaluators: HashMap<RuleType, Arc<dyn RuleEvaluator>>,
}

impl RuleRegistry {
    /// The standard wiring: validity, integrity, pass-through compatibility.
    pub fn standard() -> Self {
        let mut registry = Self {
            evaluators: HashMap::new(),
        };
        registry.register(Arc::new(ValidityRule));
        registry.register(Arc::new(IntegrityRule));
        registry.register(Arc::new(PassThroughCompatibility));
        registry
    }

    pub fn register(&mut self, evaluator: Arc<dyn RuleEvaluator>) {
        self.evaluators.insert(evaluator.rule_type(), evaluator);
    }

    /// Evaluate every configured rule against the content. The rule map is
    /// the effective set (artifact-level overriding global).
    pub fn enforce(
        &self,
        rules: &BTreeMap<RuleType, String>,
        content: &ContentWrapper,
        artifact_type: &str,
    ) -> Result<(), CoreError> {
        for (rule_type, configuration) in rules {
            if let Some(evaluator) = self.evaluators.get(rule_type) {
                evaluator.evaluate(configuration, content, artifact_type)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_content(bytes: &[u8]) -> ContentWrapper {
        ContentWrapper {
            content_type: Some("application/json".into()),
            content: bytes.to_vec(),
            references: Vec::new(),
        }
    }

    #[test]
    fn enforce_runs_configured_rules_only() {
        let registry = RuleRegistry::standard();
        let rules = BTreeMap::from([(RuleType::Validity, "SYNTAX_ONLY".to_string())]);

        let ok = registry.enforce(&rules, &json_content(b"{\"a\":1}"), "JSON");
        assert!(ok.is_ok());

        let bad = registry.enforce(&rules, &json_content(b"{\"This is not valid"), "JSON");
        assert!(matches!(bad, Err(CoreError::RuleViolation { .. })));

        // With no rules configured, invalid content passes.
        let none = registry.enforce(&BTreeMap::new(), &json_content(b"{\"This is not valid"), "JSON");
        assert!(none.is_ok());
    }
}
