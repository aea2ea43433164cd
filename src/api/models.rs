// ABOUTME: Wire types for the tracker backend API
// ABOUTME: Requests are serialized to JSON; responses share a success/error envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Registration / login payload.
///
/// Production clients send the signed `initData` string from the host platform;
/// development clients identify themselves directly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitUserRequest {
    #[serde(rename = "initData", skip_serializing_if = "Option::is_none")]
    pub init_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

impl InitUserRequest {
    pub fn signed(init_data: String) -> Self {
        Self {
            init_data: Some(init_data),
            ..Self::default()
        }
    }

    pub fn dev(telegram_id: i64, username: String) -> Self {
        Self {
            dev_mode: Some(true),
            telegram_id: Some(telegram_id),
            username: Some(username),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub subscription_end_date: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
}

impl User {
    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status.as_deref() == Some("active")
    }

    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("User")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub desired_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_sent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddItemRequest {
    pub telegram_id: i64,
    pub wb_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub days: u32,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubscriptionRequest {
    pub telegram_id: i64,
    pub plan_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSubscriptionRequest {
    pub telegram_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub subscription_end_date: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SubscriptionStatus {
    pub fn active(&self) -> bool {
        self.is_active
            .unwrap_or_else(|| self.subscription_status.as_deref() == Some("active"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferralInfo {
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub referral_link: Option<String>,
    #[serde(default)]
    pub total_referrals: u32,
    #[serde(default)]
    pub active_referrals: u32,
    #[serde(default)]
    pub bonus_days: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemResponse {
    pub item: Item,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductResponse {
    pub product: ProductInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlansResponse {
    #[serde(default)]
    pub plans: HashMap<String, Plan>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentResponse {
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_request_serialization() {
        let signed = serde_json::to_value(InitUserRequest::signed("query_id=1".into())).unwrap();
        assert_eq!(signed, json!({"initData": "query_id=1"}));

        let dev = serde_json::to_value(InitUserRequest::dev(123456, "dev_user".into())).unwrap();
        assert_eq!(dev["dev_mode"], true);
        assert_eq!(dev["telegram_id"], 123456);
        assert_eq!(dev["username"], "dev_user");
        assert!(dev.get("initData").is_none());
        assert!(dev.get("referral_code").is_none());
    }

    #[test]
    fn test_add_item_request_omits_missing_price() {
        let request = AddItemRequest {
            telegram_id: 1,
            wb_url: "12345".into(),
            desired_price: None,
        };
        let parsed = serde_json::to_value(&request).unwrap();
        assert!(parsed.get("desired_price").is_none());
        assert_eq!(parsed["wb_url"], "12345");
    }

    #[test]
    fn test_item_tolerates_missing_fields() {
        let item: Item = serde_json::from_value(json!({"id": 3, "current_price": 1000})).unwrap();
        assert_eq!(item.id, 3);
        assert_eq!(item.desired_price, 0.0);
        assert!(item.last_checked.is_none());
    }

    #[test]
    fn test_user_display_name_and_subscription() {
        let user: User = serde_json::from_value(json!({
            "telegram_id": 42,
            "username": "neo",
            "subscription_status": "active"
        }))
        .unwrap();
        assert_eq!(user.display_name(), "neo");
        assert!(user.has_active_subscription());
    }

    #[test]
    fn test_subscription_status_active() {
        let status: SubscriptionStatus =
            serde_json::from_value(json!({"subscription_status": "active"})).unwrap();
        assert!(status.active());

        let status: SubscriptionStatus =
            serde_json::from_value(json!({"subscription_status": "active", "is_active": false}))
                .unwrap();
        assert!(!status.active());
    }

    #[test]
    fn test_product_info_keeps_unknown_fields() {
        let product: ProductInfo =
            serde_json::from_value(json!({"title": "Mug", "price": 499.0, "rating": 4.8})).unwrap();
        assert_eq!(product.title.as_deref(), Some("Mug"));
        assert_eq!(product.extra["rating"], 4.8);
    }
}
