// ABOUTME: CLI entry point for wb-tracker
// ABOUTME: Parses commands, loads configuration and routes to handlers

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wb_tracker::commands;

#[derive(Parser)]
#[command(name = "wb-tracker")]
#[command(about = "Track marketplace prices and get notified when they drop", long_about = None)]
#[command(version)]
struct Cli {
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    /// Path to config.toml (defaults to ~/.wb-tracker/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL
    #[arg(long = "api-url", env = "WB_TRACKER_API_URL", global = true)]
    api_url: Option<String>,
    /// Telegram user id to act as
    #[arg(long = "telegram-id", env = "WB_TRACKER_TELEGRAM_ID", global = true)]
    telegram_id: Option<i64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register or log in
    Init {
        /// Signed initData from the host platform
        #[arg(long = "init-data")]
        init_data: Option<String>,
        /// Development mode: register with --telegram-id without a signature
        #[arg(long)]
        dev: bool,
        /// Username used in development mode
        #[arg(long, default_value = "dev_user")]
        username: String,
        /// Referral code from another user
        #[arg(long = "referral-code")]
        referral_code: Option<String>,
    },
    /// Show the user profile and subscription state
    Profile,
    /// Manage tracked items
    Items(commands::ItemsArgs),
    /// Look up a product by URL or article id
    Product {
        /// Product URL or article id
        product: String,
    },
    /// List subscription plans
    Plans,
    /// Start a subscription purchase
    Subscribe {
        /// Plan id as shown by `plans`
        plan_id: String,
    },
    /// Check whether the subscription is active
    SubscriptionStatus,
    /// Referral program
    Referrals(commands::ReferralArgs),
    /// Keep items and profile in sync and print changes as they happen
    Watch {
        /// Only watch the items list
        #[arg(long)]
        no_profile: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --log
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = wb_tracker::config::load(cli.config.as_deref())?
        .with_overrides(cli.api_url, cli.telegram_id);
    tracing::debug!("Using backend {}", config.api_url);

    match cli.command {
        Commands::Init {
            init_data,
            dev,
            username,
            referral_code,
        } => {
            let opts = commands::InitOptions {
                init_data,
                dev,
                username,
                referral_code,
            };
            commands::init(opts, &config).await
        }
        Commands::Profile => commands::profile(&config).await,
        Commands::Items(args) => commands::items::command(args, &config).await,
        Commands::Product { product } => commands::product(&product, &config).await,
        Commands::Plans => commands::subscription::plans(&config).await,
        Commands::Subscribe { plan_id } => {
            commands::subscription::subscribe(&plan_id, &config).await
        }
        Commands::SubscriptionStatus => commands::subscription::status(&config).await,
        Commands::Referrals(args) => commands::referrals::command(args, &config).await,
        Commands::Watch { no_profile } => {
            let opts = commands::WatchOptions {
                profile: !no_profile,
            };
            commands::watch::run(opts, &config).await
        }
    }
}
