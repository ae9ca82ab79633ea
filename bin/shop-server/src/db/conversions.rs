use crate::error::{ShopServerError, ShopServerResult};
use serde::{de::DeserializeOwned, Serialize};
use shop_models::{OrderItem, PaymentRecord, ShippingInfo};

fn to_json<T: Serialize>(value: &T, what: &str) -> ShopServerResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ShopServerError::InvalidData {
        message: format!("Failed to serialize {what}: {e}"),
    })
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> ShopServerResult<T> {
    serde_json::from_value(value).map_err(|e| ShopServerError::InvalidData {
        message: format!("Failed to deserialize {what}: {e}"),
    })
}

pub fn order_items_to_json(items: &[OrderItem]) -> ShopServerResult<serde_json::Value> {
    to_json(&items, "order items")
}

pub fn order_items_from_json(value: serde_json::Value) -> ShopServerResult<Vec<OrderItem>> {
    from_json(value, "order items")
}

pub fn shipping_to_json(shipping: &ShippingInfo) -> ShopServerResult<serde_json::Value> {
    to_json(shipping, "shipping info")
}

pub fn shipping_from_json(value: serde_json::Value) -> ShopServerResult<ShippingInfo> {
    from_json(value, "shipping info")
}

pub fn payments_to_json(payments: &[PaymentRecord]) -> ShopServerResult<serde_json::Value> {
    to_json(&payments, "payments")
}

pub fn payments_from_json(value: serde_json::Value) -> ShopServerResult<Vec<PaymentRecord>> {
    from_json(value, "payments")
}

/// Postgres has no unsigned integers; counts are stored as INTEGER.
pub fn count_to_db(count: u32) -> ShopServerResult<i32> {
    i32::try_from(count).map_err(|_| ShopServerError::InvalidData {
        message: format!("Count {count} exceeds database range"),
    })
}

pub fn count_from_db(count: i32) -> ShopServerResult<u32> {
    u32::try_from(count).map_err(|_| ShopServerError::InvalidData {
        message: format!("Negative count in database: {count}"),
    })
}
