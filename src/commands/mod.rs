// ABOUTME: Command implementations for each CLI subcommand
// ABOUTME: Exports user, items, subscription, referral and watch commands

pub mod items;
pub mod referrals;
pub mod subscription;
pub mod user;
pub mod watch;

pub use items::{product, ItemsArgs};
pub use referrals::ReferralArgs;
pub use user::{init, profile, InitOptions};
pub use watch::WatchOptions;
