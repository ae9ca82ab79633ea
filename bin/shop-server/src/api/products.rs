use crate::api::require_non_empty;
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
use shop_models::{is_money_amount, Product};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

fn default_active() -> bool {
    true
}

fn validate_price(price: Decimal) -> ShopServerResult<()> {
    if !is_money_amount(price) {
        return Err(ShopServerError::Validation {
            message: format!("price must be a non-negative amount in cents, got {price}"),
        });
    }
    Ok(())
}

impl CreateProductRequest {
    fn validate(&self) -> ShopServerResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("sku", &self.sku)?;
        validate_price(self.price)
    }
}

impl UpdateProductRequest {
    fn apply(self, product: &mut Product) -> ShopServerResult<()> {
        if let Some(name) = self.name {
            require_non_empty("name", &name)?;
            product.name = name;
        }
        if let Some(sku) = self.sku {
            require_non_empty("sku", &sku)?;
            product.sku = sku;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
            product.price = price;
        }
        if self.category.is_some() {
            product.category = self.category;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(())
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ShopServerResult<Json<Vec<Product>>> {
    let products = state.db.products().list(query.include_inactive).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ShopServerResult<(StatusCode, Json<Product>)> {
    request.validate()?;

    let mut product = Product::new(request.name, request.sku, request.price, request.stock);
    product.category = request.category;
    product.description = request.description;
    product.is_active = request.is_active;

    state.db.products().create(&product).await?;
    info!(product_id = %product.id, sku = %product.sku, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ShopServerResult<Json<Product>> {
    Ok(Json(state.db.products().get(product_id).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> ShopServerResult<Json<Product>> {
    let products = state.db.products();
    let mut product = products.get(product_id).await?;

    request.apply(&mut product)?;
    products.update(&product).await?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ShopServerResult<StatusCode> {
    state.db.products().soft_delete(product_id).await?;
    info!(%product_id, "Product moved to recycle bin");
    Ok(StatusCode::NO_CONTENT)
}
