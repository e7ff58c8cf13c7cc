use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Admin token from the environment; takes precedence over a stored login.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Where credentials are stored (defaults to the platform config dir).
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

fn default_api_url() -> String {
    "https://bigsolo.org".into()
}
