//! Check whether a client session's queued batch reached the log.
//!
//! The marker is consumed by the check, so a second call reports `false`.

use anyhow::Result;

use crate::{api::Api, config::Config, ui};

pub async fn run(config: &Config, session_id: &str) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let status = ui::spin("Checking session...", api.cleanup_status(session_id)).await?;

    if status.cleaned {
        ui::success(&format!("Session {} was flushed", ui::bold(session_id)));
    } else {
        ui::info(&format!("No pending flush recorded for {}", ui::bold(session_id)));
    }
    Ok(())
}
