use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub presence: PresenceConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// How often clients are expected to call heartbeat, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Entries with no heartbeat for longer than this are stale.
    pub ttl_ms: u64,
    /// Interval of the background sweep that deletes stale entries.
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/callboard.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            presence: PresenceConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 15_000,
            ttl_ms: 45_000, // 3 missed heartbeats
            sweep_interval_ms: 15_000,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("CALLBOARD_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("CALLBOARD_DATABASE_MAX_CONNECTIONS") {
            if let Some(value) = parse_u64(&v) {
                cfg.database.max_connections = value.max(1) as u32;
            }
        }
        if let Ok(v) = std::env::var("CALLBOARD_PRESENCE_HEARTBEAT_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.presence.heartbeat_interval_ms = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("CALLBOARD_PRESENCE_TTL_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.presence.ttl_ms = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("CALLBOARD_PRESENCE_SWEEP_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.presence.sweep_interval_ms = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("CALLBOARD_HISTORY_PAGE_SIZE") {
            if let Some(value) = parse_u64(&v) {
                cfg.history.default_page_size = value.clamp(1, 100) as u32;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.presence.ttl_ms < self.presence.heartbeat_interval_ms {
            return Err("Presence ttl_ms must be at least heartbeat_interval_ms".to_string());
        }
        if self.presence.sweep_interval_ms == 0 {
            return Err("Presence sweep_interval_ms must be greater than 0".to_string());
        }
        if self.history.default_page_size == 0 || self.history.max_page_size == 0 {
            return Err("History page sizes must be greater than 0".to_string());
        }
        if self.history.default_page_size > self.history.max_page_size {
            return Err("History default_page_size must not exceed max_page_size".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
