use crate::{AlertRule, CandidateAlert, RuleConfig};
use serde_json::{json, Value};
use sitemon_common::types::{AlertMetadata, Observation, Severity};

/// Fires when the latest observation's status is outside `[200, 400)`.
/// A missing status counts as failing.
pub struct StatusRule;

impl AlertRule for StatusRule {
    fn id(&self) -> &str {
        "status"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, history: &[Observation], _config: &RuleConfig) -> Option<CandidateAlert> {
        let latest = history.last()?;
        if latest.is_success() {
            return None;
        }

        let (reason, status) = match latest.status {
            Some(code) => (format!("Status {code}"), json!(code)),
            None => ("Status missing".to_string(), Value::Null),
        };

        let mut metadata = AlertMetadata::new();
        metadata.insert("status".into(), status);
        Some(CandidateAlert {
            severity: self.severity(),
            reason,
            metadata,
        })
    }
}
