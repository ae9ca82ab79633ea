use crate::api::parse_status;
use crate::db::OrderFilter;
use crate::error::ShopServerResult;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_models::{ApprovalStatus, Order, OrderStatus, PaymentKind, ShippingInfo};
use tracing::info;
use uuid::Uuid;

/// Order as returned to clients: the stored record plus derived fields the
/// console shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub balance_due: Decimal,
    pub status_label: &'static str,
    pub approval_label: &'static str,
    pub refund_label: &'static str,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            balance_due: order.balance_due(),
            status_label: order.status.label(),
            approval_label: order.approval_status.label(),
            refund_label: order.refund_status.label(),
            order,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping: ShippingInfo,
}

/// Gateway confirmation forwarded by the storefront's success page or an
/// admin entering an offline transfer.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub kind: PaymentKind,
    pub reference: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    /// False when this reference had already been recorded.
    pub applied: bool,
    pub order: OrderResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApprovalRequest {
    pub approval_status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub approval: Option<String>,
    pub user_id: Option<Uuid>,
    /// List the recycle bin instead of live orders
    #[serde(default)]
    pub deleted: bool,
}

impl AdminOrderQuery {
    fn into_filter(self) -> ShopServerResult<OrderFilter> {
        Ok(OrderFilter {
            status: self
                .status
                .as_deref()
                .map(parse_status::<OrderStatus>)
                .transpose()?,
            approval_status: self
                .approval
                .as_deref()
                .map(parse_status::<ApprovalStatus>)
                .transpose()?,
            user_id: self.user_id,
            deleted: self.deleted,
        })
    }
}

fn respond(orders: Vec<Order>) -> Json<Vec<OrderResponse>> {
    Json(orders.into_iter().map(OrderResponse::from).collect())
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<CheckoutRequest>,
) -> ShopServerResult<(StatusCode, Json<OrderResponse>)> {
    let order = state
        .order_manager
        .checkout(user_id, request.shipping)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ShopServerResult<Json<Vec<OrderResponse>>> {
    let filter = OrderFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    Ok(respond(state.order_manager.list(&filter).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ShopServerResult<Json<OrderResponse>> {
    Ok(Json(state.order_manager.get(order_id).await?.into()))
}

pub async fn record_payment(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> ShopServerResult<Json<PaymentResponse>> {
    let outcome = state
        .order_manager
        .record_payment(order_id, request.kind, request.reference, request.amount)
        .await?;

    Ok(Json(PaymentResponse {
        applied: outcome.applied,
        order: outcome.order.into(),
    }))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.cancel(order_id, request.reason).await?;
    Ok(Json(order.into()))
}

pub async fn admin_list_orders(
    State(state): State<AppState>,
    Query(query): Query<AdminOrderQuery>,
) -> ShopServerResult<Json<Vec<OrderResponse>>> {
    let filter = query.into_filter()?;
    Ok(respond(state.order_manager.list(&filter).await?))
}

pub async fn admin_update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ShopServerResult<Json<OrderResponse>> {
    let target: OrderStatus = parse_status(&request.status)?;
    info!(%order_id, target = %target, "Admin status change requested");

    let order = state.order_manager.update_status(order_id, target).await?;
    Ok(Json(order.into()))
}

pub async fn admin_update_approval(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateApprovalRequest>,
) -> ShopServerResult<Json<OrderResponse>> {
    let target: ApprovalStatus = parse_status(&request.approval_status)?;

    let order = state
        .order_manager
        .update_approval(order_id, target, request.reason)
        .await?;
    Ok(Json(order.into()))
}

pub async fn admin_reject(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.reject(order_id, request.reason).await?;
    Ok(Json(order.into()))
}

pub async fn admin_complete(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.complete(order_id).await?;
    Ok(Json(order.into()))
}

pub async fn admin_refund(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ReasonRequest>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.refund(order_id, request.reason).await?;
    Ok(Json(order.into()))
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.soft_delete(order_id).await?;
    Ok(Json(order.into()))
}

pub async fn admin_restore(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> ShopServerResult<Json<OrderResponse>> {
    let order = state.order_manager.restore(order_id).await?;
    Ok(Json(order.into()))
}
