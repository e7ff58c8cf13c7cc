//! Trigger log aggregation on the server.

use anyhow::Result;

use crate::{api::Api, config::Config, credentials, ui};

pub async fn run(config: &Config) -> Result<()> {
    let token = credentials::get_admin_token(config)?;
    let api = Api::new(config.api_url.clone());

    let summary = ui::spin("Processing logs...", api.process_logs(token)).await?;

    ui::success(summary.trim());
    Ok(())
}
