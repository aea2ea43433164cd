// ABOUTME: Subscription commands: list plans, start a purchase, check status
// ABOUTME: Payment itself happens in the browser at the returned payment URL

use anyhow::Result;

use crate::api::ApiClient;
use crate::catalog::{format_rub, plan_list_price};
use crate::commands::user::format_date;
use crate::config::AppConfig;

pub async fn plans(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let plans = client.subscription_plans().await?;

    if plans.is_empty() {
        println!("No subscription plans available.");
        return Ok(());
    }

    println!("Subscription plans:");
    for (id, plan) in &plans {
        let list_price = plan_list_price(plan)
            .map(|p| format!(" (was {}, -{}%)", format_rub(p as f64), plan.discount))
            .unwrap_or_default();
        println!(
            "  {:<10} {} - {} days - {}{}",
            id,
            plan.name,
            plan.days,
            format_rub(plan.price),
            list_price
        );
        if !plan.description.is_empty() {
            println!("             {}", plan.description);
        }
    }
    Ok(())
}

pub async fn subscribe(plan_id: &str, config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let telegram_id = config.require_telegram_id()?;

    let payment_url = client.create_subscription(telegram_id, plan_id).await?;
    tracing::info!("Created subscription payment for plan {}", plan_id);
    println!("Complete the payment at:");
    println!("  {}", payment_url);
    println!("Then run `subscription-status` (or keep `watch` running) to see it activate.");
    Ok(())
}

pub async fn status(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let telegram_id = config.require_telegram_id()?;

    let status = client.check_subscription(telegram_id).await?;
    if status.active() {
        match status.subscription_end_date.as_deref() {
            Some(end) => println!("Subscription: active until {}", format_date(end)),
            None => println!("Subscription: active"),
        }
    } else {
        println!("Subscription: inactive");
    }
    Ok(())
}
