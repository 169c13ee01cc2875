//! Durable alert log and mute windows.
//!
//! The default implementation ([`engine::SqliteStore`]) keeps both tables in
//! one SQLite database. Every mutating call is a single statement executed
//! under the connection lock, so writes are all-or-nothing and reads see a
//! consistent snapshot.

pub mod engine;
pub mod error;

#[cfg(test)]
mod tests;

use error::Result;
use sitemon_common::types::{Alert, Mute, NewAlert};

/// Filters for [`AlertStore::list_alerts`]. Present filters are ANDed.
///
/// # Examples
///
/// ```
/// use sitemon_storage::AlertQuery;
///
/// let query = AlertQuery::new(50).for_target("site-a").since(1_700_000_000_000);
/// assert_eq!(query.limit, 50);
/// assert_eq!(query.target_id.as_deref(), Some("site-a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertQuery {
    pub limit: usize,
    /// Inclusive lower bound on `raised_at`.
    pub since_time: Option<i64>,
    pub target_id: Option<String>,
}

impl AlertQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn since(mut self, since_time: i64) -> Self {
        self.since_time = Some(since_time);
        self
    }

    pub fn for_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }
}

/// Append-only log of raised alerts with acknowledgment state.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the evaluator and the REST handlers use the store concurrently.
pub trait AlertStore: Send + Sync {
    /// Appends an alert, assigning a fresh id and `raised_at = now`.
    fn add_alert(&self, alert: &NewAlert) -> Result<Alert>;

    /// Lists alerts most recent first, bounded by `query.limit`.
    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>>;

    /// Gets a single alert by id.
    fn get_alert(&self, id: i64) -> Result<Option<Alert>>;

    /// Marks an alert acknowledged. Returns false if no such alert exists;
    /// acknowledging twice succeeds both times.
    fn acknowledge_alert(&self, id: i64) -> Result<bool>;

    /// Round-trips a trivial query to confirm the backing storage answers.
    fn ping(&self) -> Result<()>;
}

/// Time-bounded suppression windows per target.
pub trait MuteStore: Send + Sync {
    /// Records a new mute window. Overlapping windows are kept side by side.
    fn mute(&self, target_id: &str, until: i64, reason: Option<&str>) -> Result<Mute>;

    /// True iff any window for `target_id` has `until > at`.
    fn is_muted(&self, target_id: &str, at: i64) -> Result<bool>;

    /// Windows for `target_id` still in force at `at`, latest expiry first.
    fn active_mutes(&self, target_id: &str, at: i64) -> Result<Vec<Mute>>;
}
