//! Manage the pending interaction log.

use anyhow::Result;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::{api::Api, config::Config, credentials, ui};

/// Drops every pending log entry (and IP locks / cleanup markers) unprocessed.
pub async fn clear(config: &Config, yes: bool) -> Result<()> {
    let token = credentials::get_admin_token(config)?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete every pending interaction log without processing it?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let api = Api::new(config.api_url.clone());
    let response = ui::spin("Clearing logs...", api.clear_logs(token)).await?;

    ui::success(&response.message);
    Ok(())
}
