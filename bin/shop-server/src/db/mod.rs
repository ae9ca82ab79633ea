pub mod cart_repo;
pub mod conversions;
pub mod deposit_setting_repo;
pub mod order_repo;
pub mod product_repo;
pub mod row_mappers;

pub use cart_repo::CartRepository;
pub use deposit_setting_repo::DepositSettingRepository;
pub use order_repo::{OrderFilter, OrderRepository};
pub use product_repo::ProductRepository;

use crate::error::ShopServerResult;
use sqlx::{
    migrate::Migrator,
    postgres::{PgPool, PgPoolOptions},
    Postgres, Transaction,
};
use std::time::Duration;
use tracing::info;

// Embeds all migration files from ./migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with connection pooling and automatic migrations
    pub async fn connect(database_url: &str) -> ShopServerResult<Self> {
        info!("Connecting to database...");

        let pool = Self::pool_options().connect(database_url).await?;

        Self::from_pool(pool).await
    }

    /// Create a Database instance from an existing pool (useful for tests)
    pub async fn from_pool(pool: PgPool) -> ShopServerResult<Self> {
        info!("Running database migrations...");
        MIGRATOR.run(&pool).await?;
        info!("Database initialization complete");
        Ok(Self { pool })
    }

    /// A handle that opens connections on first use and skips migrations.
    /// Router tests use it for requests that never reach the database.
    pub fn connect_lazy(database_url: &str) -> ShopServerResult<Self> {
        let pool = Self::pool_options()
            .min_connections(0)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> ShopServerResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn deposit_settings(&self) -> DepositSettingRepository {
        DepositSettingRepository::new(self.pool.clone())
    }
}
