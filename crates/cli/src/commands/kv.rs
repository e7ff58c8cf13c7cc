//! Browse and edit the raw KV namespaces.

use anyhow::Result;
use shared::api::{DeleteKeyPayload, KvViewerResponse, Namespace};
use tabled::{Table, Tabled, settings::Style};

use crate::{api::Api, config::Config, credentials, ui};

const VALUE_WIDTH: usize = 80;

#[derive(Tabled)]
struct KvRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn rows(page: &KvViewerResponse) -> Vec<KvRow> {
    page.items
        .iter()
        .map(|item| KvRow {
            key: item.key.clone(),
            value: item
                .value
                .as_deref()
                .map(|v| ui::truncate(v, VALUE_WIDTH))
                .unwrap_or_else(|| "(expired)".to_string()),
        })
        .collect()
}

pub async fn list(config: &Config, namespace: Namespace, cursor: Option<String>) -> Result<()> {
    let token = credentials::get_admin_token(config)?;
    let api = Api::new(config.api_url.clone());

    let page = ui::spin(
        &format!("Listing {namespace}..."),
        api.kv_list(token, namespace, cursor.as_deref()),
    )
    .await?;

    if page.items.is_empty() {
        println!("{} is empty", ui::bold(namespace.as_str()));
        return Ok(());
    }

    let table = Table::new(rows(&page)).with(Style::rounded()).to_string();
    println!("{table}");

    if let Some(next) = page.cursor.filter(|_| page.has_more) {
        ui::info(&format!(
            "More keys available: bigsolo-admin kv list {namespace} --cursor '{next}'"
        ));
    }

    Ok(())
}

pub async fn delete(config: &Config, namespace: Namespace, key: String) -> Result<()> {
    let token = credentials::get_admin_token(config)?;
    let api = Api::new(config.api_url.clone());

    let payload = DeleteKeyPayload {
        namespace: namespace.as_str().to_string(),
        key,
    };
    let response = ui::spin("Deleting key...", api.kv_delete(token, payload)).await?;

    ui::success(&response.message);
    Ok(())
}
