use serde::Serialize;
use sitemon_alert::engine::RuleEngine;
use sitemon_alert::{RuleConfig, RuleOverrides};
use sitemon_common::clock::Clock;
use sitemon_common::types::{Alert, Observation};
use sitemon_storage::error::StorageError;
use sitemon_storage::{AlertStore, MuteStore};
use std::sync::Arc;

/// Result of evaluating one observation batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub created: Vec<Alert>,
    pub muted: bool,
}

impl EvaluationOutcome {
    fn muted() -> Self {
        Self {
            created: Vec::new(),
            muted: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    /// The mute lookup failed; nothing was evaluated or written.
    #[error("failed to read mute state for {target_id}: {source}")]
    MuteCheck {
        target_id: String,
        #[source]
        source: StorageError,
    },

    /// Writing a candidate failed. Alerts written earlier in the same batch
    /// stay persisted and are carried here.
    #[error(
        "failed to persist alert for {target_id} after {} were written: {source}",
        .persisted.len()
    )]
    Persist {
        target_id: String,
        persisted: Vec<Alert>,
        #[source]
        source: StorageError,
    },
}

/// Runs mute check, rule evaluation and alert persistence for a target.
///
/// Calls for different targets are fully independent. Two concurrent calls
/// for the same target may both pass the mute check and write duplicate
/// alerts; alerts are append-only, so that is tolerated.
pub struct Evaluator {
    engine: RuleEngine,
    alerts: Arc<dyn AlertStore>,
    mutes: Arc<dyn MuteStore>,
    clock: Arc<dyn Clock>,
    default_rules: RuleConfig,
}

impl Evaluator {
    pub fn new(
        engine: RuleEngine,
        alerts: Arc<dyn AlertStore>,
        mutes: Arc<dyn MuteStore>,
        clock: Arc<dyn Clock>,
        default_rules: RuleConfig,
    ) -> Self {
        Self {
            engine,
            alerts,
            mutes,
            clock,
            default_rules,
        }
    }

    pub fn default_rules(&self) -> &RuleConfig {
        &self.default_rules
    }

    pub fn process(
        &self,
        target_id: &str,
        history: &[Observation],
        overrides: Option<&RuleOverrides>,
    ) -> Result<EvaluationOutcome, EvaluateError> {
        let now = self.clock.now_millis();

        let muted = self
            .mutes
            .is_muted(target_id, now)
            .map_err(|source| EvaluateError::MuteCheck {
                target_id: target_id.to_string(),
                source,
            })?;
        if muted {
            tracing::debug!(target_id, "Target muted, skipping evaluation");
            return Ok(EvaluationOutcome::muted());
        }

        let config = match overrides {
            Some(o) => self.default_rules.with_overrides(o),
            None => self.default_rules,
        };
        let candidates = self.engine.evaluate(target_id, history, &config);

        let mut created = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.alerts.add_alert(&candidate.into_new_alert(target_id)) {
                Ok(alert) => created.push(alert),
                Err(source) => {
                    tracing::error!(
                        target_id,
                        persisted = created.len(),
                        error = %source,
                        "Failed to persist alert"
                    );
                    return Err(EvaluateError::Persist {
                        target_id: target_id.to_string(),
                        persisted: created,
                        source,
                    });
                }
            }
        }

        if !created.is_empty() {
            tracing::info!(target_id, count = created.len(), "Generated alerts");
        }

        Ok(EvaluationOutcome {
            created,
            muted: false,
        })
    }
}
