use crate::error::ShopServerResult;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_models::{round_money, CartError, CartLine, Product};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub user_id: Uuid,
    pub lines: Vec<CartLineResponse>,
    /// Sum over lines that can still be ordered.
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    /// False when the product was withdrawn or stock dropped below the
    /// requested quantity. Checkout fails until the line is fixed.
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

impl CartResponse {
    fn from_lines(user_id: Uuid, lines: Vec<CartLine>) -> Self {
        let lines: Vec<CartLineResponse> = lines
            .into_iter()
            .map(|line| {
                let available =
                    line.product.is_purchasable() && line.quantity <= line.product.stock;
                CartLineResponse {
                    product_id: line.product.id,
                    line_total: line.product.price * Decimal::from(line.quantity),
                    name: line.product.name,
                    sku: line.product.sku,
                    unit_price: line.product.price,
                    quantity: line.quantity,
                    available,
                }
            })
            .collect();

        let subtotal = round_money(
            lines
                .iter()
                .filter(|line| line.available)
                .map(|line| line.line_total)
                .sum(),
        );

        Self {
            user_id,
            lines,
            subtotal,
        }
    }
}

/// Same rules checkout applies, so a short line fails here with the same status.
fn check_quantity(product: &Product, quantity: u32) -> Result<(), CartError> {
    if !product.is_purchasable() {
        return Err(CartError::ProductUnavailable { id: product.id });
    }
    if quantity > product.stock {
        return Err(CartError::InsufficientStock {
            id: product.id,
            requested: quantity,
            available: product.stock,
        });
    }
    Ok(())
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ShopServerResult<Json<CartResponse>> {
    let lines = state.db.carts().lines(user_id).await?;
    Ok(Json(CartResponse::from_lines(user_id, lines)))
}

pub async fn set_cart_quantity(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetQuantityRequest>,
) -> ShopServerResult<Json<CartResponse>> {
    if request.quantity > 0 {
        let product = state.db.products().get(product_id).await?;
        check_quantity(&product, request.quantity)?;
    }

    let carts = state.db.carts();
    carts
        .set_quantity(user_id, product_id, request.quantity)
        .await?;

    let lines = carts.lines(user_id).await?;
    Ok(Json(CartResponse::from_lines(user_id, lines)))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ShopServerResult<StatusCode> {
    state.db.carts().clear(state.db.pool(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
