use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form structured details attached to an alert (e.g. `{"latency": 1250.0}`).
pub type AlertMetadata = Map<String, Value>;

/// A single health sample for one monitored target.
///
/// Wire payloads produced by the poller use the short keys `t` and `lat`;
/// both spellings are accepted. Numeric fields are read leniently (see
/// [`crate::lenient`]); an unreadable status counts as missing.
///
/// # Examples
///
/// ```
/// use sitemon_common::types::Observation;
///
/// let obs: Observation = serde_json::from_str(r#"{"t": 5, "lat": 42.0, "status": 200}"#).unwrap();
/// assert_eq!(obs.timestamp, 5);
/// assert_eq!(obs.latency, Some(42.0));
/// assert!(obs.is_success());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, alias = "t", deserialize_with = "crate::lenient::i64_or_zero")]
    pub timestamp: i64,
    #[serde(default, alias = "lat", deserialize_with = "crate::lenient::optional_f64")]
    pub latency: Option<f64>,
    #[serde(default, deserialize_with = "crate::lenient::optional_i64")]
    pub status: Option<i64>,
}

/// Status codes in `[200, 400)` count as a successful check.
pub const SUCCESS_STATUS_RANGE: std::ops::Range<i64> = 200..400;

/// Stand-in for an absent status code. Lies outside the success range.
pub const MISSING_STATUS: i64 = 0;

impl Observation {
    pub fn new(timestamp: i64, latency: Option<f64>, status: Option<i64>) -> Self {
        Self {
            timestamp,
            latency,
            status,
        }
    }

    /// The status code with absent values mapped to [`MISSING_STATUS`].
    pub fn effective_status(&self) -> i64 {
        self.status.unwrap_or(MISSING_STATUS)
    }

    pub fn is_success(&self) -> bool {
        SUCCESS_STATUS_RANGE.contains(&self.effective_status())
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use sitemon_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// A persisted alert row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub target_id: String,
    pub severity: Severity,
    pub reason: String,
    pub metadata: Option<AlertMetadata>,
    pub raised_at: i64,
    pub acknowledged: bool,
}

/// Fields supplied when appending an alert; id and `raised_at` are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub target_id: String,
    pub severity: Severity,
    pub reason: String,
    pub metadata: Option<AlertMetadata>,
}

/// A time-bounded suppression window for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mute {
    pub id: i64,
    pub target_id: String,
    pub until: i64,
    pub reason: Option<String>,
    pub created_at: i64,
}

impl Mute {
    /// Whether this window still suppresses evaluation at `at` (exclusive bound).
    pub fn is_active_at(&self, at: i64) -> bool {
        self.until > at
    }
}
