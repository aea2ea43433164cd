// ABOUTME: User registration and profile commands
// ABOUTME: init registers via signed initData or dev mode; profile prints subscription state

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate};

use crate::api::{ApiClient, InitUserRequest, User};
use crate::config::AppConfig;

pub struct InitOptions {
    pub init_data: Option<String>,
    pub dev: bool,
    pub username: String,
    pub referral_code: Option<String>,
}

pub async fn init(opts: InitOptions, config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;

    let mut request = match (opts.init_data, opts.dev) {
        (Some(data), false) => InitUserRequest::signed(data),
        (None, true) => InitUserRequest::dev(config.require_telegram_id()?, opts.username),
        (Some(_), true) => bail!("Use either --init-data or --dev, not both"),
        (None, false) => bail!("Provide --init-data from the host platform, or --dev for development mode"),
    };
    request.referral_code = opts.referral_code;

    let user = client
        .init_user(&request)
        .await
        .context("Failed to initialize user")?;
    tracing::info!("Initialized user {}", user.telegram_id);

    println!("Welcome, {}!", user.display_name());
    print_profile(&user);
    Ok(())
}

pub async fn profile(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let telegram_id = config.require_telegram_id()?;
    let user = client.get_user(telegram_id).await?;
    print_profile(&user);
    Ok(())
}

pub fn print_profile(user: &User) {
    println!("User: {}", user.display_name());
    if let Some(username) = &user.username {
        println!("  Username: @{}", username);
    }
    println!("  Telegram id: {}", user.telegram_id);
    println!("  Subscription: {}", subscription_text(user));
}

/// "Active until DD.MM.YYYY" or "Inactive".
pub fn subscription_text(user: &User) -> String {
    if !user.has_active_subscription() {
        return "Inactive".to_string();
    }
    match user.subscription_end_date.as_deref() {
        Some(date) => format!("Active until {}", format_date(date)),
        None => "Active".to_string(),
    }
}

/// Render an RFC 3339 timestamp or ISO date as DD.MM.YYYY; other strings pass through.
pub fn format_date(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%d.%m.%Y").to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.format("%d.%m.%Y").to_string();
    }
    raw.to_string()
}
