use chrono::{DateTime, Utc};
use shop_models::{ApprovalStatus, Order, OrderStatus};
use sqlx::postgres::PgPool;
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::conversions::{order_items_to_json, payments_to_json, shipping_to_json};
use super::row_mappers::FromRow;
use crate::error::{ShopServerError, ShopServerResult};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, items, shipping,
    total, deposit_percent, deposit_amount, amount_paid,
    status, approval_status, refund_status, payments,
    cancel_reason, reject_reason, is_delete, deleted_at,
    completed_at, created_at, updated_at
";

/// Admin listing filter. `deleted = true` lists the recycle bin.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub approval_status: Option<ApprovalStatus>,
    pub user_id: Option<Uuid>,
    pub deleted: bool,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, order: &Order) -> ShopServerResult<()> {
        sqlx::query(
            r"
            INSERT INTO orders (
                id, order_number, user_id, items, shipping,
                total, deposit_percent, deposit_amount, amount_paid,
                status, approval_status, refund_status, payments,
                cancel_reason, reject_reason, is_delete, deleted_at,
                completed_at, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            ",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(order_items_to_json(&order.items)?)
        .bind(shipping_to_json(&order.shipping)?)
        .bind(order.total)
        .bind(order.deposit_percent)
        .bind(order.deposit_amount)
        .bind(order.amount_paid)
        .bind(order.status)
        .bind(order.approval_status)
        .bind(order.refund_status)
        .bind(payments_to_json(&order.payments)?)
        .bind(&order.cancel_reason)
        .bind(&order.reject_reason)
        .bind(order.is_delete)
        .bind(order.deleted_at)
        .bind(order.completed_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> ShopServerResult<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Order::from_row(&row)
    }

    /// Load an order and hold its row lock until `conn`'s transaction ends.
    pub async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> ShopServerResult<Order> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_one(conn)
        .await?;

        Order::from_row(&row)
    }

    /// Persist everything a transition can touch.
    pub async fn update<'e, E>(&self, executor: E, order: &Order) -> ShopServerResult<()>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET
                amount_paid = $2,
                status = $3,
                approval_status = $4,
                refund_status = $5,
                payments = $6,
                cancel_reason = $7,
                reject_reason = $8,
                is_delete = $9,
                deleted_at = $10,
                completed_at = $11,
                updated_at = $12
            WHERE id = $1
            ",
        )
        .bind(order.id)
        .bind(order.amount_paid)
        .bind(order.status)
        .bind(order.approval_status)
        .bind(order.refund_status)
        .bind(payments_to_json(&order.payments)?)
        .bind(&order.cancel_reason)
        .bind(&order.reject_reason)
        .bind(order.is_delete)
        .bind(order.deleted_at)
        .bind(order.completed_at)
        .bind(order.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }

    pub async fn list(&self, filter: &OrderFilter) -> ShopServerResult<Vec<Order>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE is_delete = "));
        query.push_bind(filter.deleted);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(approval_status) = filter.approval_status {
            query.push(" AND approval_status = ").push_bind(approval_status);
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }

        if filter.deleted {
            query.push(" ORDER BY deleted_at DESC");
        } else {
            query.push(" ORDER BY created_at DESC");
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(Order::from_row).collect()
    }

    /// Ids of unpaid orders placed before `cutoff`, oldest first.
    pub async fn stale_pending_ids(&self, cutoff: DateTime<Utc>) -> ShopServerResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            r"
            SELECT id
            FROM orders
            WHERE status = $1 AND is_delete = FALSE AND created_at < $2
            ORDER BY created_at
            ",
        )
        .bind(OrderStatus::Pending)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Permanently remove an order. Only orders already in the recycle bin
    /// can be purged.
    pub async fn purge(&self, id: Uuid) -> ShopServerResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND is_delete = TRUE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }
}
