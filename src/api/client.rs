// ABOUTME: HTTP client for the tracker backend API
// ABOUTME: Normalizes HTTP failures and success=false envelopes into errors

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::models::{
    AddItemRequest, CheckSubscriptionRequest, CreateSubscriptionRequest, InitUserRequest, Item,
    ItemResponse, ItemsResponse, PaymentResponse, Plan, PlansResponse, ProductInfo,
    ProductResponse, ReferralInfo, SubscriptionStatus, User, UserResponse,
};

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "https://back-8vq3.onrender.com";

pub struct ApiClient {
    client: Client,
    api_base_url: String,
}

impl ApiClient {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(api_base_url)
            .with_context(|| format!("Invalid API URL: {}", api_base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API URL must use http or https, got '{}'", parsed.scheme());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Register or log in a user.
    pub async fn init_user(&self, request: &InitUserRequest) -> Result<User> {
        let response: UserResponse = self
            .send(
                self.client.post(self.url("/api/user/init")).json(request),
                "initialize user",
            )
            .await?;
        Ok(response.user)
    }

    pub async fn get_user(&self, telegram_id: i64) -> Result<User> {
        let response: UserResponse = self
            .send(
                self.client
                    .get(self.url("/api/user/info"))
                    .query(&[("telegram_id", telegram_id)]),
                "fetch user",
            )
            .await?;
        Ok(response.user)
    }

    pub async fn list_items(&self, telegram_id: i64) -> Result<Vec<Item>> {
        let response: ItemsResponse = self
            .send(
                self.client
                    .get(self.url("/api/items/list"))
                    .query(&[("telegram_id", telegram_id)]),
                "fetch items",
            )
            .await?;
        Ok(response.items)
    }

    pub async fn add_item(&self, request: &AddItemRequest) -> Result<Item> {
        let response: ItemResponse = self
            .send(
                self.client.post(self.url("/api/items/add")).json(request),
                "add item",
            )
            .await?;
        Ok(response.item)
    }

    pub async fn delete_item(&self, item_id: i64, telegram_id: i64) -> Result<()> {
        let _: Value = self
            .send(
                self.client
                    .delete(self.url(&format!("/api/items/delete/{}", item_id)))
                    .query(&[("telegram_id", telegram_id)]),
                "delete item",
            )
            .await?;
        Ok(())
    }

    pub async fn product_info(&self, article_id: u64) -> Result<ProductInfo> {
        let response: ProductResponse = self
            .send(
                self.client
                    .get(self.url("/api/wb/product-info"))
                    .query(&[("article_id", article_id)]),
                "fetch product info",
            )
            .await?;
        Ok(response.product)
    }

    /// Available plans, sorted by duration.
    pub async fn subscription_plans(&self) -> Result<Vec<(String, Plan)>> {
        let response: PlansResponse = self
            .send(
                self.client.get(self.url("/api/subscription/plans")),
                "fetch subscription plans",
            )
            .await?;
        let mut plans: Vec<(String, Plan)> = response.plans.into_iter().collect();
        plans.sort_by(|a, b| a.1.days.cmp(&b.1.days).then_with(|| a.0.cmp(&b.0)));
        Ok(plans)
    }

    /// Start a subscription purchase. Returns the payment URL to open.
    pub async fn create_subscription(&self, telegram_id: i64, plan_id: &str) -> Result<String> {
        let request = CreateSubscriptionRequest {
            telegram_id,
            plan_id: plan_id.to_string(),
        };
        let response: PaymentResponse = self
            .send(
                self.client
                    .post(self.url("/api/subscription/create"))
                    .json(&request),
                "create subscription",
            )
            .await?;
        response
            .payment_url
            .ok_or_else(|| anyhow::anyhow!("Backend did not return a payment URL"))
    }

    pub async fn check_subscription(&self, telegram_id: i64) -> Result<SubscriptionStatus> {
        self.send(
            self.client
                .post(self.url("/api/subscription/check"))
                .json(&CheckSubscriptionRequest { telegram_id }),
            "check subscription",
        )
        .await
    }

    pub async fn referral_info(&self, telegram_id: i64) -> Result<ReferralInfo> {
        self.send(
            self.client
                .get(self.url("/api/user/referrals"))
                .query(&[("telegram_id", telegram_id)]),
            "fetch referral info",
        )
        .await
    }

    pub async fn apply_referral_code(&self, telegram_id: i64, code: &str) -> Result<User> {
        let request = InitUserRequest {
            telegram_id: Some(telegram_id),
            referral_code: Some(code.to_string()),
            ..InitUserRequest::default()
        };
        let response: UserResponse = self
            .send(
                self.client.post(self.url("/api/user/init")).json(&request),
                "apply referral code",
            )
            .await?;
        Ok(response.user)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to {}: backend unreachable", action))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let value: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            if let Some(message) = value.as_ref().and_then(server_error) {
                anyhow::bail!("{}", message);
            }
            if status == StatusCode::NOT_FOUND {
                anyhow::bail!("Failed to {}: endpoint not found (404)", action);
            }
            anyhow::bail!("Failed to {}: backend returned {}: {}", action, status, body);
        }

        let value = value.with_context(|| format!("Failed to parse {} response", action))?;
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            match server_error(&value) {
                Some(message) => anyhow::bail!("{}", message),
                None => anyhow::bail!("Failed to {}", action),
            }
        }

        serde_json::from_value(value).with_context(|| format!("Failed to parse {} response", action))
    }
}

fn server_error(value: &Value) -> Option<&str> {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
}
