// ABOUTME: Synchronizer factories for the polled resources (items list, user profile)
// ABOUTME: Wires ApiClient calls as fetch functions and field rules as change detectors

use anyhow::Result;
use std::sync::Arc;

use crate::api::{ApiClient, Item, User};
use crate::sync::{FieldRules, JsonChangeDetector, KeyedSynchronizer, PollingConfig, Synchronizer};

/// Synchronizer for the items a user tracks.
pub fn items_synchronizer(
    client: Arc<ApiClient>,
    telegram_id: i64,
    config: PollingConfig,
    rules: FieldRules,
) -> Result<Synchronizer<Vec<Item>>> {
    let sync = Synchronizer::new(
        format!("items:{}", telegram_id),
        move || {
            let client = Arc::clone(&client);
            async move { client.list_items(telegram_id).await }
        },
        JsonChangeDetector::new(rules),
        config,
    )?;
    Ok(sync)
}

/// Synchronizer for the user profile (subscription state, names).
pub fn profile_synchronizer(
    client: Arc<ApiClient>,
    telegram_id: i64,
    config: PollingConfig,
    rules: FieldRules,
) -> Result<Synchronizer<User>> {
    let sync = Synchronizer::new(
        format!("profile:{}", telegram_id),
        move || {
            let client = Arc::clone(&client);
            async move { client.get_user(telegram_id).await }
        },
        JsonChangeDetector::new(rules),
        config,
    )?;
    Ok(sync)
}

/// Items synchronizer keyed by telegram id.
pub fn keyed_items(
    client: Arc<ApiClient>,
    config: PollingConfig,
    rules: FieldRules,
) -> KeyedSynchronizer<i64, Vec<Item>> {
    KeyedSynchronizer::new(move |telegram_id: &i64| {
        items_synchronizer(
            Arc::clone(&client),
            *telegram_id,
            config.clone(),
            rules.clone(),
        )
    })
}

/// Profile synchronizer keyed by telegram id.
pub fn keyed_profile(
    client: Arc<ApiClient>,
    config: PollingConfig,
    rules: FieldRules,
) -> KeyedSynchronizer<i64, User> {
    KeyedSynchronizer::new(move |telegram_id: &i64| {
        profile_synchronizer(
            Arc::clone(&client),
            *telegram_id,
            config.clone(),
            rules.clone(),
        )
    })
}
