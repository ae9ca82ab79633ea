use shop_models::DepositSetting;
use sqlx::postgres::PgPool;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use super::row_mappers::FromRow;
use crate::error::{ShopServerError, ShopServerResult};

#[derive(Clone)]
pub struct DepositSettingRepository {
    pool: PgPool,
}

impl DepositSettingRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every setting ordered by `min_total`, inactive rows included unless
    /// `active_only`.
    pub async fn list(&self, active_only: bool) -> ShopServerResult<Vec<DepositSetting>> {
        let rows = sqlx::query(
            r"
            SELECT id, min_total, max_total, percent, is_active, created_at, updated_at
            FROM deposit_settings
            WHERE is_active OR NOT $1
            ORDER BY min_total, created_at
            ",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(DepositSetting::from_row).collect()
    }

    pub async fn get(&self, id: Uuid) -> ShopServerResult<DepositSetting> {
        let row = sqlx::query(
            r"
            SELECT id, min_total, max_total, percent, is_active, created_at, updated_at
            FROM deposit_settings
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        DepositSetting::from_row(&row)
    }

    /// Insert or update a setting after checking it against the rest of the
    /// schedule. The table is locked for the duration so two concurrent
    /// saves cannot both pass the overlap check.
    pub async fn save(&self, setting: &DepositSetting) -> ShopServerResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE deposit_settings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing = Self::active_in(&mut tx).await?;
        setting.validate_against(&existing)?;

        sqlx::query(
            r"
            INSERT INTO deposit_settings (
                id, min_total, max_total, percent, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                min_total = EXCLUDED.min_total,
                max_total = EXCLUDED.max_total,
                percent = EXCLUDED.percent,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            ",
        )
        .bind(setting.id)
        .bind(setting.min_total)
        .bind(setting.max_total)
        .bind(setting.percent)
        .bind(setting.is_active)
        .bind(setting.created_at)
        .bind(setting.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            setting_id = %setting.id,
            min_total = %setting.min_total,
            max_total = ?setting.max_total,
            percent = %setting.percent,
            "Saved deposit setting"
        );
        Ok(())
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> ShopServerResult<()> {
        if is_active {
            // Re-enabling must pass the overlap check again
            let mut setting = self.get(id).await?;
            setting.is_active = true;
            return self.save(&setting).await;
        }

        let result = sqlx::query(
            "UPDATE deposit_settings SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> ShopServerResult<()> {
        let result = sqlx::query("DELETE FROM deposit_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ShopServerError::NotFound);
        }
        Ok(())
    }

    async fn active_in(conn: &mut PgConnection) -> ShopServerResult<Vec<DepositSetting>> {
        let rows = sqlx::query(
            r"
            SELECT id, min_total, max_total, percent, is_active, created_at, updated_at
            FROM deposit_settings
            WHERE is_active
            ",
        )
        .fetch_all(conn)
        .await?;

        rows.iter().map(DepositSetting::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use rust_decimal_macros::dec;

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_overlapping_setting_is_rejected(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let db = Database::from_pool(pool).await.unwrap();
        let repo = db.deposit_settings();

        repo.save(&DepositSetting::new(dec!(0), Some(dec!(999.99)), dec!(50)))
            .await
            .unwrap();
        let result = repo
            .save(&DepositSetting::new(dec!(500), None, dec!(20)))
            .await;
        assert!(matches!(result, Err(ShopServerError::Conflict { .. })));

        let upper = DepositSetting::new(dec!(1000), None, dec!(20));
        repo.save(&upper).await.unwrap();
        assert_eq!(repo.list(true).await.unwrap().len(), 2);

        repo.set_active(upper.id, false).await.unwrap();
        assert_eq!(repo.list(true).await.unwrap().len(), 1);
        assert_eq!(repo.list(false).await.unwrap().len(), 2);

        Ok(())
    }
}
