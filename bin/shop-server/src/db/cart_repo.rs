use shop_models::CartLine;
use sqlx::postgres::PgPool;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::conversions::count_to_db;
use super::row_mappers::FromRow;
use crate::error::ShopServerResult;

#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Set the quantity of one product in a cart. Zero removes the line.
    pub async fn set_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> ShopServerResult<()> {
        if quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity, added_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(count_to_db(quantity)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cart rows joined with the current product records, oldest first.
    pub async fn lines(&self, user_id: Uuid) -> ShopServerResult<Vec<CartLine>> {
        let rows = sqlx::query(
            r"
            SELECT
                p.id, p.name, p.sku, p.category, p.description, p.price, p.stock,
                p.is_active, p.is_delete, p.created_at, p.updated_at,
                c.quantity AS cart_quantity
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at, p.name
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(CartLine::from_row).collect()
    }

    pub async fn clear<'e, E>(&self, executor: E, user_id: Uuid) -> ShopServerResult<u64>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Drop the given products from a cart, leaving anything else the
    /// buyer added after checkout.
    pub async fn remove_products<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        product_ids: &[Uuid],
    ) -> ShopServerResult<u64>
    where
        E: PgExecutor<'e>,
    {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
                .bind(user_id)
                .bind(product_ids)
                .execute(executor)
                .await?;

        Ok(result.rows_affected())
    }
}
