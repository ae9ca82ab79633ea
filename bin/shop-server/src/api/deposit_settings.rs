use crate::error::{ShopServerError, ShopServerResult};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shop_models::{DepositQuote, DepositSetting};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct DepositSettingRequest {
    pub min_total: Decimal,
    #[serde(default)]
    pub max_total: Option<Decimal>,
    pub percent: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteQuery {
    pub total: Decimal,
}

fn default_active() -> bool {
    true
}

pub async fn list_active(
    State(state): State<AppState>,
) -> ShopServerResult<Json<Vec<DepositSetting>>> {
    Ok(Json(state.db.deposit_settings().list(true).await?))
}

pub async fn admin_list(
    State(state): State<AppState>,
) -> ShopServerResult<Json<Vec<DepositSetting>>> {
    Ok(Json(state.db.deposit_settings().list(false).await?))
}

/// Deposit the storefront will ask for on a cart of `total`.
pub async fn quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> ShopServerResult<Json<DepositQuote>> {
    if query.total < Decimal::ZERO {
        return Err(ShopServerError::Validation {
            message: format!("total must not be negative, got {}", query.total),
        });
    }

    let schedule = state.order_manager.deposit_schedule().await?;
    Ok(Json(schedule.quote(query.total)))
}

pub async fn admin_create(
    State(state): State<AppState>,
    Json(request): Json<DepositSettingRequest>,
) -> ShopServerResult<(StatusCode, Json<DepositSetting>)> {
    let mut setting = DepositSetting::new(request.min_total, request.max_total, request.percent);
    setting.is_active = request.is_active;
    // Reject obviously bad rows before taking the table lock
    setting.validate()?;

    state.db.deposit_settings().save(&setting).await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn admin_update(
    State(state): State<AppState>,
    Path(setting_id): Path<Uuid>,
    Json(request): Json<DepositSettingRequest>,
) -> ShopServerResult<Json<DepositSetting>> {
    let repo = state.db.deposit_settings();
    let mut setting = repo.get(setting_id).await?;

    setting.min_total = request.min_total;
    setting.max_total = request.max_total;
    setting.percent = request.percent;
    setting.is_active = request.is_active;
    setting.updated_at = Utc::now();
    setting.validate()?;

    repo.save(&setting).await?;
    Ok(Json(setting))
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Path(setting_id): Path<Uuid>,
) -> ShopServerResult<StatusCode> {
    state.db.deposit_settings().delete(setting_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
