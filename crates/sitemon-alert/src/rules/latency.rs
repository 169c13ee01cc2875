use crate::{AlertRule, CandidateAlert, RuleConfig};
use serde_json::json;
use sitemon_common::types::{AlertMetadata, Observation, Severity};

/// Fires when the latest observation's latency is strictly above the
/// configured threshold. An absent latency never fires.
pub struct LatencyRule;

impl AlertRule for LatencyRule {
    fn id(&self) -> &str {
        "latency"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, history: &[Observation], config: &RuleConfig) -> Option<CandidateAlert> {
        let latest = history.last()?;
        let latency = latest.latency?;
        let threshold = config.latency_threshold_ms;

        if latency <= threshold as f64 {
            return None;
        }

        let mut metadata = AlertMetadata::new();
        metadata.insert("latency".into(), json!(latency));
        Some(CandidateAlert {
            severity: self.severity(),
            reason: format!("High latency > {threshold}ms"),
            metadata,
        })
    }
}
