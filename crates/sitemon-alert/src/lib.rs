//! Alert rule engine for endpoint health histories.
//!
//! The engine runs a fixed, ordered set of [`AlertRule`] implementations
//! over the observation history of one target and returns the candidate
//! alerts they produce. Evaluation is pure: no I/O, no shared mutable
//! state, deterministic for identical inputs.

pub mod engine;
pub mod rules;


use serde::{Deserialize, Serialize};
use sitemon_common::types::{AlertMetadata, NewAlert, Observation, Severity};

pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_CONSECUTIVE_FAILURES: u32 = 3;

/// A rule that inspects an observation history and optionally produces a
/// [`CandidateAlert`].
///
/// Rules receive the full history (oldest first) and are only invoked when
/// it is non-empty.
pub trait AlertRule: Send + Sync {
    /// Stable identifier used in logs (e.g. `"latency"`).
    fn id(&self) -> &str;

    /// The severity assigned to candidates produced by this rule.
    fn severity(&self) -> Severity;

    fn evaluate(&self, history: &[Observation], config: &RuleConfig) -> Option<CandidateAlert>;
}

/// An alert the engine proposes; persistence assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAlert {
    pub severity: Severity,
    pub reason: String,
    pub metadata: AlertMetadata,
}

impl CandidateAlert {
    pub fn into_new_alert(self, target_id: &str) -> NewAlert {
        NewAlert {
            target_id: target_id.to_string(),
            severity: self.severity,
            reason: self.reason,
            metadata: Some(self.metadata),
        }
    }
}

/// Thresholds the built-in rules evaluate against.
///
/// `consecutive_failures == 0` disables the consecutive-failure rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,
    #[serde(default = "default_consecutive_failures")]
    pub consecutive_failures: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            latency_threshold_ms: default_latency_threshold_ms(),
            consecutive_failures: default_consecutive_failures(),
        }
    }
}

fn default_latency_threshold_ms() -> u64 {
    DEFAULT_LATENCY_THRESHOLD_MS
}

fn default_consecutive_failures() -> u32 {
    DEFAULT_CONSECUTIVE_FAILURES
}

/// Per-call rule settings supplied alongside a history. Absent fields keep
/// the base configuration.
///
/// Values are accepted loosely: numbers may be floats or numeric strings,
/// unreadable values are ignored, negative thresholds clamp to zero and a
/// non-positive failure count turns the consecutive-failure rule off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleOverrides {
    #[serde(default, deserialize_with = "sitemon_common::lenient::optional_f64")]
    pub latency_threshold_ms: Option<f64>,
    #[serde(default, deserialize_with = "sitemon_common::lenient::optional_i64")]
    pub consecutive_failures: Option<i64>,
}

impl RuleConfig {
    /// Returns a copy of `self` with the overrides applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitemon_alert::{RuleConfig, RuleOverrides};
    ///
    /// let merged = RuleConfig::default().with_overrides(&RuleOverrides {
    ///     latency_threshold_ms: Some(250.0),
    ///     consecutive_failures: Some(-1),
    /// });
    /// assert_eq!(merged.latency_threshold_ms, 250);
    /// assert_eq!(merged.consecutive_failures, 0);
    /// ```
    pub fn with_overrides(&self, overrides: &RuleOverrides) -> Self {
        let mut merged = *self;
        if let Some(threshold) = overrides.latency_threshold_ms {
            // `as` saturates and maps NaN to 0
            merged.latency_threshold_ms = threshold.max(0.0) as u64;
        }
        if let Some(count) = overrides.consecutive_failures {
            merged.consecutive_failures = count.clamp(0, i64::from(u32::MAX)) as u32;
        }
        merged
    }
}
