// ABOUTME: Referral program commands
// ABOUTME: Shows the user's referral code and stats, or applies someone else's code

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::api::ApiClient;
use crate::config::AppConfig;

#[derive(Args)]
pub struct ReferralArgs {
    #[command(subcommand)]
    command: ReferralCommands,
}

#[derive(Subcommand)]
enum ReferralCommands {
    /// Show your referral code and statistics
    Show,
    /// Apply a referral code you received
    Apply {
        /// The referral code
        code: String,
    },
}

pub async fn command(args: ReferralArgs, config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let telegram_id = config.require_telegram_id()?;

    match args.command {
        ReferralCommands::Show => {
            let info = client.referral_info(telegram_id).await?;
            match (&info.referral_code, &info.referral_link) {
                (_, Some(link)) => println!("Your referral link: {}", link),
                (Some(code), None) => println!("Your referral code: {}", code),
                (None, None) => println!("No referral code assigned yet."),
            }
            println!("  Invited: {}", info.total_referrals);
            println!("  Active: {}", info.active_referrals);
            println!("  Bonus days earned: {}", info.bonus_days);
        }
        ReferralCommands::Apply { code } => {
            let code = code.trim();
            if code.is_empty() {
                bail!("Referral code must not be empty");
            }
            client.apply_referral_code(telegram_id, code).await?;
            println!("Referral code applied.");
        }
    }
    Ok(())
}
