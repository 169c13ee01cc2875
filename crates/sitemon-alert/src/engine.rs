use crate::rules::{ConsecutiveFailureRule, LatencyRule, StatusRule};
use crate::{AlertRule, CandidateAlert, RuleConfig};
use sitemon_common::types::Observation;

/// Runs the ordered rule set over a target's history.
///
/// Candidates come back in rule order with no cross-rule deduplication; a
/// single history can legitimately trip several rules at once.
pub struct RuleEngine {
    rules: Vec<Box<dyn AlertRule>>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(vec![
            Box::new(LatencyRule),
            Box::new(StatusRule),
            Box::new(ConsecutiveFailureRule),
        ])
    }
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn AlertRule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn AlertRule>] {
        &self.rules
    }

    pub fn evaluate(
        &self,
        target_id: &str,
        history: &[Observation],
        config: &RuleConfig,
    ) -> Vec<CandidateAlert> {
        if history.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for rule in &self.rules {
            if let Some(candidate) = rule.evaluate(history, config) {
                tracing::debug!(
                    target_id,
                    rule_id = rule.id(),
                    severity = %candidate.severity,
                    reason = %candidate.reason,
                    "Rule fired"
                );
                candidates.push(candidate);
            }
        }
        candidates
    }
}
