use serde::{Deserialize, Serialize};
use sitemon_alert::RuleConfig;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// SQLite file holding the `alerts` and `mutes` tables.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Page size for `GET /v1/alerts` when the caller omits `limit`.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: usize,
    /// Allowed CORS origins; empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    /// Baseline thresholds; per-request `rules` override individual fields.
    #[serde(default)]
    pub rules: RuleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            database_path: default_database_path(),
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
            cors_allowed_origins: Vec::new(),
            rules: RuleConfig::default(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "data/sitemon.db".to_string()
}

fn default_list_limit() -> usize {
    100
}

fn default_max_list_limit() -> usize {
    1000
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Caps a requested page size at `max_list_limit`.
    pub fn resolve_limit(&self, requested: Option<u64>) -> usize {
        let max = self.max_list_limit;
        match requested {
            Some(n) => usize::try_from(n).unwrap_or(max).min(max),
            None => self.default_list_limit.min(max),
        }
    }
}
