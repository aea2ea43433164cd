// ABOUTME: Backend API client and wire models
// ABOUTME: Every call returns Result; backend-reported failures become errors

pub mod client;
pub mod models;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use models::{
    AddItemRequest, InitUserRequest, Item, Plan, ProductInfo, ReferralInfo, SubscriptionStatus,
    User,
};
