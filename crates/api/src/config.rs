use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Redis URL backing the KV namespaces. Without one, an in-memory store is used.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Root of the static series data (config.json, series/, avatars.json).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Bearer token required by admin endpoints.
    pub admin_token: String,
    #[serde(default)]
    pub admin_username: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    /// Shared secret a scheduler sends in `X-Cron-Secret` to trigger processing.
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// Run the log processor in-process every N seconds (0 disables it).
    #[serde(default)]
    pub process_interval_secs: u64,
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_secs: u64,
    #[serde(default = "default_cleanup_ttl")]
    pub cleanup_ttl_secs: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8788
}

fn default_data_dir() -> String {
    "public/data".into()
}

fn default_lock_ttl() -> u64 {
    300
}

fn default_cleanup_ttl() -> u64 {
    600
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}
