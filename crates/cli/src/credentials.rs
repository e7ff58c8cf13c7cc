//! Admin token storage (`<config dir>/bigsolo/credentials.json`).
//!
//! `BIGSOLO_ADMIN_TOKEN` overrides whatever `login` stored.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileCredentials {
    admin_token: Option<String>,
}

fn credentials_path(config: &Config) -> PathBuf {
    config
        .config_dir
        .clone()
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bigsolo")
        .join("credentials.json")
}

fn load_file_credentials(config: &Config) -> FileCredentials {
    let path = credentials_path(config);
    if path.exists() {
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    } else {
        FileCredentials::default()
    }
}

fn save_file_credentials(config: &Config, creds: &FileCredentials) -> Result<()> {
    let path = credentials_path(config);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(creds)?;
    std::fs::write(&path, json)?;

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Load the admin token, with a helpful error if not signed in.
pub fn get_admin_token(config: &Config) -> Result<String> {
    if let Some(token) = config.admin_token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(token.clone());
    }

    load_file_credentials(config)
        .admin_token
        .ok_or_else(|| anyhow!("Not signed in. Run: bigsolo-admin login"))
}

pub fn set_admin_token(config: &Config, token: String) -> Result<()> {
    let mut creds = load_file_credentials(config);
    creds.admin_token = Some(token);
    save_file_credentials(config, &creds)
}

/// Delete stored credentials. Returns whether anything was removed.
pub fn delete_all(config: &Config) -> Result<bool> {
    let path = credentials_path(config);
    if path.exists() {
        std::fs::remove_file(&path)?;
        return Ok(true);
    }
    Ok(false)
}
