// ABOUTME: Integration tests for ApiClient against a mock backend
// ABOUTME: Covers each endpoint, success=false envelopes and HTTP failures

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wb_tracker::api::{AddItemRequest, ApiClient, InitUserRequest};
use wb_tracker::feeds;
use wb_tracker::sync::{CycleOutcome, FieldRules, PollingConfig};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri()).unwrap();
    (server, client)
}

fn user_json() -> serde_json::Value {
    json!({
        "id": 7,
        "telegram_id": 123456,
        "username": "dev_user",
        "first_name": "Anna",
        "subscription_status": "active",
        "subscription_end_date": "2026-12-31T00:00:00Z",
        "last_active": "2026-10-19T08:00:00Z"
    })
}

// =============================================================================
// User
// =============================================================================

#[tokio::test]
async fn test_init_user_dev_mode() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/user/init"))
        .and(body_json(json!({
            "dev_mode": true,
            "telegram_id": 123456,
            "username": "dev_user"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "user": user_json()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let user = client
        .init_user(&InitUserRequest::dev(123456, "dev_user".into()))
        .await
        .unwrap();
    assert_eq!(user.telegram_id, 123456);
    assert!(user.has_active_subscription());
}

#[tokio::test]
async fn test_get_user() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user/info"))
        .and(query_param("telegram_id", "123456"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "user": user_json()})),
        )
        .mount(&server)
        .await;

    let user = client.get_user(123456).await.unwrap();
    assert_eq!(user.display_name(), "Anna");
}

#[tokio::test]
async fn test_apply_referral_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/user/init"))
        .and(body_json(json!({"telegram_id": 123456, "referral_code": "FRIEND"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "user": user_json()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.apply_referral_code(123456, "FRIEND").await.unwrap();
}

#[tokio::test]
async fn test_referral_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user/referrals"))
        .and(query_param("telegram_id", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "referral_code": "ABC123",
            "total_referrals": 3,
            "active_referrals": 1,
            "bonus_days": 7
        })))
        .mount(&server)
        .await;

    let info = client.referral_info(123456).await.unwrap();
    assert_eq!(info.referral_code.as_deref(), Some("ABC123"));
    assert_eq!(info.total_referrals, 3);
    assert_eq!(info.bonus_days, 7);
}

// =============================================================================
// Items
// =============================================================================

#[tokio::test]
async fn test_list_items() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .and(query_param("telegram_id", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "items": [
                {"id": 1, "title": "Sneakers", "current_price": 1000, "desired_price": 900, "last_checked": "t0"},
                {"id": 2, "title": "Kettle", "current_price": 2490.5, "desired_price": 2000}
            ]
        })))
        .mount(&server)
        .await;

    let items = client.list_items(123456).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].current_price, 1000.0);
    assert_eq!(items[1].title, "Kettle");
}

#[tokio::test]
async fn test_add_item() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/items/add"))
        .and(body_json(json!({"telegram_id": 123456, "wb_url": "12345678"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "item": {"id": 9, "title": "Jacket", "current_price": 5000, "desired_price": 4500}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let item = client
        .add_item(&AddItemRequest {
            telegram_id: 123456,
            wb_url: "12345678".into(),
            desired_price: None,
        })
        .await
        .unwrap();
    assert_eq!(item.id, 9);
    assert_eq!(item.desired_price, 4500.0);
}

#[tokio::test]
async fn test_add_item_limit_reached() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/items/add"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "error": "Item limit reached for the free plan"
        })))
        .mount(&server)
        .await;

    let err = client
        .add_item(&AddItemRequest {
            telegram_id: 123456,
            wb_url: "12345678".into(),
            desired_price: Some(100.0),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Item limit reached for the free plan");
}

#[tokio::test]
async fn test_delete_item() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/items/delete/9"))
        .and(query_param("telegram_id", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_item(9, 123456).await.unwrap();
}

#[tokio::test]
async fn test_product_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/wb/product-info"))
        .and(query_param("article_id", "12345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "product": {"title": "Jacket", "price": 4999, "brand": "North", "rating": 4.8}
        })))
        .mount(&server)
        .await;

    let product = client.product_info(12345678).await.unwrap();
    assert_eq!(product.brand.as_deref(), Some("North"));
    assert_eq!(product.price, Some(4999.0));
    assert_eq!(product.extra["rating"], json!(4.8));
}

// =============================================================================
// Subscription
// =============================================================================

#[tokio::test]
async fn test_subscription_plans_sorted_by_duration() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/subscription/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "plans": {
                "year": {"name": "Year", "price": 1990, "days": 365, "discount": 45},
                "month": {"name": "Month", "price": 299, "days": 30},
                "quarter": {"name": "3 months", "price": 749, "days": 90, "discount": 17}
            }
        })))
        .mount(&server)
        .await;

    let plans = client.subscription_plans().await.unwrap();
    let ids: Vec<&str> = plans.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["month", "quarter", "year"]);
    assert_eq!(plans[2].1.discount, 45.0);
}

#[tokio::test]
async fn test_create_subscription_returns_payment_url() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/subscription/create"))
        .and(body_json(json!({"telegram_id": 123456, "plan_id": "month"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "payment_url": "https://pay.example.com/checkout/abc"
        })))
        .mount(&server)
        .await;

    let url = client.create_subscription(123456, "month").await.unwrap();
    assert_eq!(url, "https://pay.example.com/checkout/abc");
}

#[tokio::test]
async fn test_create_subscription_without_payment_url_fails() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/subscription/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let err = client.create_subscription(123456, "month").await.unwrap_err();
    assert!(err.to_string().contains("payment URL"));
}

#[tokio::test]
async fn test_check_subscription() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/subscription/check"))
        .and(body_json(json!({"telegram_id": 123456})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "subscription_status": "active",
            "subscription_end_date": "2026-12-31"
        })))
        .mount(&server)
        .await;

    let status = client.check_subscription(123456).await.unwrap();
    assert!(status.active());
}

// =============================================================================
// Error handling
// =============================================================================

#[tokio::test]
async fn test_success_false_without_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let err = client.list_items(1).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch items");
}

#[tokio::test]
async fn test_http_error_without_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.list_items(1).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("502"), "unexpected error: {}", message);
    assert!(message.contains("Bad Gateway"));
}

#[tokio::test]
async fn test_not_found() {
    let (_server, client) = setup().await;

    let err = client.get_user(1).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_malformed_json_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    assert!(client.list_items(1).await.is_err());
}

// =============================================================================
// Feeds over the mock backend
// =============================================================================

#[tokio::test]
async fn test_items_feed_ignores_last_checked_churn() {
    let (server, client) = setup().await;
    let client = Arc::new(client);

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "items": [{"id": 1, "current_price": 1000, "desired_price": 900, "last_checked": "t0"}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "items": [{"id": 1, "current_price": 1000, "desired_price": 900, "last_checked": "t1"}]
        })))
        .mount(&server)
        .await;

    let config = PollingConfig {
        min_update_interval: Duration::ZERO,
        ..PollingConfig::default()
    };
    let sync = feeds::items_synchronizer(client, 123456, config, FieldRules::items()).unwrap();

    assert_eq!(sync.refetch(false).await, CycleOutcome::Published);
    let first = sync.snapshot();
    assert_eq!(sync.refetch(false).await, CycleOutcome::Unchanged);
    let second = sync.snapshot();
    assert!(second.same_data(&first));
    assert_eq!(second.last_updated, first.last_updated);
}

#[tokio::test]
async fn test_items_feed_records_backend_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/items/list"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "Network Error"
        })))
        .mount(&server)
        .await;

    let sync = feeds::items_synchronizer(
        Arc::new(client),
        123456,
        PollingConfig::default(),
        FieldRules::items(),
    )
    .unwrap();

    assert_eq!(
        sync.refetch(true).await,
        CycleOutcome::Failed("Network Error".into())
    );
    let state = sync.snapshot();
    assert_eq!(state.error.as_deref(), Some("Network Error"));
    assert!(state.data.is_none());
    assert!(!state.loading);
}
