use crate::{money::round_money, OrderItem, Product};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snafu::{ensure, Snafu};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// A cart row joined with the current product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartQuote {
    pub items: Vec<OrderItem>,
    pub total: Decimal,
}

#[derive(Debug, Snafu, PartialEq)]
pub enum CartError {
    #[snafu(display("Cart is empty"))]
    EmptyCart,

    #[snafu(display("Product {} is no longer available", id))]
    ProductUnavailable { id: Uuid },

    #[snafu(display(
        "Product {} has {} in stock, {} requested",
        id,
        available,
        requested
    ))]
    InsufficientStock {
        id: Uuid,
        requested: u32,
        available: u32,
    },

    #[snafu(display("Quantity for product {} must be at least 1", id))]
    InvalidQuantity { id: Uuid },
}

/// Snapshot current prices into order items and total them.
///
/// Stock is checked here so checkout fails early, but the authoritative
/// check happens when stock is deducted on the first payment.
pub fn price_cart(lines: &[CartLine]) -> Result<CartQuote, CartError> {
    ensure!(!lines.is_empty(), EmptyCartSnafu);

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let product = &line.product;
        ensure!(line.quantity > 0, InvalidQuantitySnafu { id: product.id });
        ensure!(
            product.is_purchasable(),
            ProductUnavailableSnafu { id: product.id }
        );
        ensure!(
            line.quantity <= product.stock,
            InsufficientStockSnafu {
                id: product.id,
                requested: line.quantity,
                available: product.stock,
            }
        );

        items.push(OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
        });
    }

    let total = round_money(items.iter().map(OrderItem::line_total).sum());
    Ok(CartQuote { items, total })
}
