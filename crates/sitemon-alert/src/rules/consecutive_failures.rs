use crate::{AlertRule, CandidateAlert, RuleConfig};
use serde_json::json;
use sitemon_common::types::{AlertMetadata, Observation, Severity};

/// Fires once the trailing run of failed observations reaches
/// `consecutive_failures`.
///
/// The scan walks backward from the latest observation and stops as soon as
/// the threshold is met, so the reported count is always exactly the
/// configured threshold, even when the real streak is longer.
pub struct ConsecutiveFailureRule;

impl AlertRule for ConsecutiveFailureRule {
    fn id(&self) -> &str {
        "consecutive_failures"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, history: &[Observation], config: &RuleConfig) -> Option<CandidateAlert> {
        let threshold = config.consecutive_failures;
        if threshold == 0 {
            return None;
        }

        let mut count: u32 = 0;
        for observation in history.iter().rev() {
            if observation.is_success() {
                break;
            }
            count += 1;
            if count >= threshold {
                let mut metadata = AlertMetadata::new();
                metadata.insert("count".into(), json!(count));
                return Some(CandidateAlert {
                    severity: self.severity(),
                    reason: format!("{count} consecutive failures"),
                    metadata,
                });
            }
        }

        None
    }
}
