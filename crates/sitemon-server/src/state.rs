use crate::config::ServerConfig;
use crate::evaluator::Evaluator;
use chrono::{DateTime, Utc};
use sitemon_alert::engine::RuleEngine;
use sitemon_common::clock::Clock;
use sitemon_storage::engine::SqliteStore;
use sitemon_storage::{AlertStore, MuteStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
    pub alerts: Arc<dyn AlertStore>,
    pub mutes: Arc<dyn MuteStore>,
    pub clock: Arc<dyn Clock>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wires the evaluator and both API surfaces to one shared store.
    pub fn new(store: Arc<SqliteStore>, clock: Arc<dyn Clock>, config: ServerConfig) -> Self {
        Self::with_stores(store.clone(), store, clock, config)
    }

    pub fn with_stores(
        alerts: Arc<dyn AlertStore>,
        mutes: Arc<dyn MuteStore>,
        clock: Arc<dyn Clock>,
        config: ServerConfig,
    ) -> Self {
        let evaluator = Evaluator::new(
            RuleEngine::default(),
            alerts.clone(),
            mutes.clone(),
            clock.clone(),
            config.rules,
        );
        Self {
            evaluator: Arc::new(evaluator),
            alerts,
            mutes,
            clock,
            start_time: Utc::now(),
            config: Arc::new(config),
        }
    }
}
