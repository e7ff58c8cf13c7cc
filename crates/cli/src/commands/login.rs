//! Sign in as admin and store the admin token locally.
//!
//! The server exchanges the admin username/password for its admin token;
//! every admin command then sends it as a bearer token.

use anyhow::Result;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use shared::api::LoginPayload;

use crate::{api::Api, config::Config, credentials, ui};

pub async fn run(config: &Config, username: Option<String>) -> Result<()> {
    let theme = ColorfulTheme::default();

    let username = match username {
        Some(u) => u,
        None => Input::with_theme(&theme)
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;

    authenticate(config, LoginPayload { username, password }).await?;

    ui::success("Signed in");
    Ok(())
}

async fn authenticate(config: &Config, payload: LoginPayload) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let response = ui::spin("Signing in...", api.login(payload)).await?;

    if !response.success || response.token.is_empty() {
        anyhow::bail!("Invalid credentials");
    }

    credentials::set_admin_token(config, response.token)
}

pub async fn logout(config: &Config) -> Result<()> {
    if credentials::delete_all(config)? {
        ui::success("Signed out");
    } else {
        ui::info("Not signed in");
    }
    Ok(())
}
