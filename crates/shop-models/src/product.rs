use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    // Hidden from the storefront but kept for existing orders
    pub is_active: bool,
    pub is_delete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn new(name: String, sku: String, price: Decimal, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            sku,
            category: None,
            description: None,
            price,
            stock,
            is_active: true,
            is_delete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the product can be put into a new order.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.is_active && !self.is_delete
    }
}
