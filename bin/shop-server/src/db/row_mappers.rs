use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shop_models::{
    ApprovalStatus, CartLine, DepositSetting, Order, OrderStatus, Product, RefundStatus,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use super::conversions::{
    count_from_db, order_items_from_json, payments_from_json, shipping_from_json,
};
use crate::error::ShopServerResult;

pub trait FromRow<'r>: Sized {
    fn from_row(row: &'r PgRow) -> ShopServerResult<Self>;
}

impl<'r> FromRow<'r> for Product {
    fn from_row(row: &'r PgRow) -> ShopServerResult<Self> {
        let stock: i32 = row.try_get("stock")?;

        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock: count_from_db(stock)?,
            is_active: row.try_get("is_active")?,
            is_delete: row.try_get("is_delete")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r> for CartLine {
    fn from_row(row: &'r PgRow) -> ShopServerResult<Self> {
        let quantity: i32 = row.try_get("cart_quantity")?;

        Ok(CartLine {
            product: Product::from_row(row)?,
            quantity: count_from_db(quantity)?,
        })
    }
}

impl<'r> FromRow<'r> for DepositSetting {
    fn from_row(row: &'r PgRow) -> ShopServerResult<Self> {
        Ok(DepositSetting {
            id: row.try_get("id")?,
            min_total: row.try_get("min_total")?,
            max_total: row.try_get("max_total")?,
            percent: row.try_get("percent")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r> for Order {
    fn from_row(row: &'r PgRow) -> ShopServerResult<Self> {
        let id: Uuid = row.try_get("id")?;
        let order_number: String = row.try_get("order_number")?;
        let user_id: Uuid = row.try_get("user_id")?;

        // JSONB columns
        let items: serde_json::Value = row.try_get("items")?;
        let shipping: serde_json::Value = row.try_get("shipping")?;
        let payments: serde_json::Value = row.try_get("payments")?;

        let total: Decimal = row.try_get("total")?;
        let deposit_percent: Decimal = row.try_get("deposit_percent")?;
        let deposit_amount: Decimal = row.try_get("deposit_amount")?;
        let amount_paid: Decimal = row.try_get("amount_paid")?;

        let status: OrderStatus = row.try_get("status")?;
        let approval_status: ApprovalStatus = row.try_get("approval_status")?;
        let refund_status: RefundStatus = row.try_get("refund_status")?;

        let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;
        let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Order {
            id,
            order_number,
            user_id,
            items: order_items_from_json(items)?,
            shipping: shipping_from_json(shipping)?,
            total,
            deposit_percent,
            deposit_amount,
            amount_paid,
            status,
            approval_status,
            refund_status,
            payments: payments_from_json(payments)?,
            cancel_reason: row.try_get("cancel_reason")?,
            reject_reason: row.try_get("reject_reason")?,
            is_delete: row.try_get("is_delete")?,
            deleted_at,
            completed_at,
            created_at,
            updated_at,
        })
    }
}
