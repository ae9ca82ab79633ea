use shop_models::Product;
use sqlx::postgres::PgPool;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::conversions::count_to_db;
use super::row_mappers::FromRow;
use crate::error::{ShopServerError, ShopServerResult};

const PRODUCT_COLUMNS: &str = r"
    id, name, sku, category, description, price, stock,
    is_active, is_delete, created_at, updated_at
";

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, product: &Product) -> ShopServerResult<()> {
        sqlx::query(
            r"
            INSERT INTO products (
                id, name, sku, category, description, price, stock,
                is_active, is_delete, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(count_to_db(product.stock)?)
        .bind(product.is_active)
        .bind(product.is_delete)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> ShopServerResult<Product> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_delete = FALSE"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Product::from_row(&row)
    }

    /// Catalog listing. Soft-deleted products are never returned.
    pub async fn list(&self, include_inactive: bool) -> ShopServerResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_delete = FALSE AND (is_active OR $1)
            ORDER BY name
            "
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Product::from_row).collect()
    }

    pub async fn update(&self, product: &Product) -> ShopServerResult<()> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET
                name = $2,
                sku = $3,
                category = $4,
                description = $5,
                price = $6,
                stock = $7,
                is_active = $8,
                updated_at = NOW()
            WHERE id = $1 AND is_delete = FALSE
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(count_to_db(product.stock)?)
        .bind(product.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }

    pub async fn soft_delete(&self, id: Uuid) -> ShopServerResult<()> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET is_delete = TRUE, is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_delete = FALSE
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }

    /// Take `quantity` units out of stock. Returns false, changing nothing,
    /// when fewer than `quantity` units are left.
    pub async fn deduct_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity: u32,
    ) -> ShopServerResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(product_id)
        .bind(count_to_db(quantity)?)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Put units back, including for products deleted since the order.
    pub async fn restore_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        quantity: u32,
    ) -> ShopServerResult<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .bind(count_to_db(quantity)?)
        .execute(executor)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use rust_decimal_macros::dec;

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_stock_never_goes_negative(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let db = Database::from_pool(pool.clone()).await.unwrap();
        let products = db.products();

        let product = Product::new("Blister packer".to_string(), "BP-200".to_string(), dec!(18000), 3);
        products.create(&product).await.unwrap();

        assert!(products.deduct_stock(&pool, product.id, 2).await.unwrap());
        assert!(!products.deduct_stock(&pool, product.id, 2).await.unwrap());
        assert_eq!(products.get(product.id).await.unwrap().stock, 1);

        products.restore_stock(&pool, product.id, 2).await.unwrap();
        assert_eq!(products.get(product.id).await.unwrap().stock, 3);

        Ok(())
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_soft_deleted_products_are_hidden(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let db = Database::from_pool(pool).await.unwrap();
        let products = db.products();

        let product = Product::new("Tablet press".to_string(), "TP-10".to_string(), dec!(9500), 1);
        products.create(&product).await.unwrap();
        assert_eq!(products.list(false).await.unwrap().len(), 1);

        products.soft_delete(product.id).await.unwrap();

        assert!(products.list(true).await.unwrap().is_empty());
        assert!(matches!(
            products.get(product.id).await,
            Err(ShopServerError::NotFound)
        ));
        assert!(matches!(
            products.soft_delete(product.id).await,
            Err(ShopServerError::NotFound)
        ));

        Ok(())
    }
}
