use crate::{
    api::{cart, deposit_settings, orders, products},
    config::Settings,
    db::Database,
    services::{OrderManager, OrderMonitoringService},
    BackgroundTaskSnafu, DatabaseInitSnafu, InvalidCorsOriginSnafu, MonitoringSnafu, Result,
    ServerBindSnafu, ServerStartSnafu, SettingsSnafu, ShopServerArgs,
};
use axum::{
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use common::handle_background_thread_result;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::{net::SocketAddr, sync::Arc};
use tokio::task::JoinSet;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub order_manager: Arc<OrderManager>,
    pub settings: Arc<Settings>,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, settings: Arc<Settings>) -> Self {
        let order_manager = Arc::new(OrderManager::new(db.clone(), settings.clone()));
        Self {
            db,
            order_manager,
            settings,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Status {
    status: String,
    version: String,
    currency: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/status", get(status_handler))
        // Catalog
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/:id",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        // Cart and checkout
        .route(
            "/api/v1/users/:user_id/cart",
            get(cart::get_cart).delete(cart::clear_cart),
        )
        .route(
            "/api/v1/users/:user_id/cart/:product_id",
            put(cart::set_cart_quantity),
        )
        .route("/api/v1/users/:user_id/checkout", post(orders::checkout))
        .route("/api/v1/users/:user_id/orders", get(orders::list_user_orders))
        // Buyer order actions
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/payments", post(orders::record_payment))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel_order))
        // Admin order console
        .route("/api/v1/admin/orders", get(orders::admin_list_orders))
        .route(
            "/api/v1/admin/orders/:id",
            axum::routing::delete(orders::admin_delete),
        )
        .route(
            "/api/v1/admin/orders/:id/status",
            put(orders::admin_update_status),
        )
        .route(
            "/api/v1/admin/orders/:id/approval",
            put(orders::admin_update_approval),
        )
        .route("/api/v1/admin/orders/:id/reject", post(orders::admin_reject))
        .route(
            "/api/v1/admin/orders/:id/complete",
            post(orders::admin_complete),
        )
        .route("/api/v1/admin/orders/:id/refund", post(orders::admin_refund))
        .route(
            "/api/v1/admin/orders/:id/restore",
            post(orders::admin_restore),
        )
        // Deposit schedule
        .route(
            "/api/v1/deposit-settings",
            get(deposit_settings::list_active),
        )
        .route(
            "/api/v1/deposit-settings/quote",
            get(deposit_settings::quote),
        )
        .route(
            "/api/v1/admin/deposit-settings",
            get(deposit_settings::admin_list).post(deposit_settings::admin_create),
        )
        .route(
            "/api/v1/admin/deposit-settings/:id",
            put(deposit_settings::admin_update).delete(deposit_settings::admin_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(domain: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if domain == "*" {
        return Ok(cors.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(domain)
        .ok()
        .context(InvalidCorsOriginSnafu { origin: domain })?;
    Ok(cors.allow_origin(origin))
}

pub async fn run_server(args: ShopServerArgs) -> Result<()> {
    info!("Starting shop server...");

    let addr = SocketAddr::from((args.host, args.port));

    // Load configuration
    let settings = Arc::new(Settings::load(&args.config_file).context(SettingsSnafu)?);
    let db = Database::connect(&args.database_url)
        .await
        .context(DatabaseInitSnafu)?;

    let state = AppState::new(db, settings.clone());

    let mut app = build_router(state.clone());
    if let Some(domain) = &args.cors_domain {
        app = app.layer(cors_layer(domain)?);
    }

    let mut join_set: JoinSet<Result<()>> = JoinSet::new();

    match settings.pending_order_ttl() {
        Some(ttl) => {
            let monitoring_service = Arc::new(OrderMonitoringService::new(
                state.order_manager.clone(),
                settings.monitor_interval(),
                ttl,
            ));
            info!("Starting order monitoring service...");
            join_set.spawn(async move { monitoring_service.run().await.context(MonitoringSnafu) });
        }
        None => info!("Pending order expiry disabled"),
    }

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(ServerBindSnafu)?;

    join_set.spawn(async move {
        axum::serve(listener, app).await.context(ServerStartSnafu)
    });

    handle_background_thread_result("shop-server task", join_set.join_next().await)
        .context(BackgroundTaskSnafu)
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(Status {
        status: "online".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        currency: state.settings.currency.clone(),
    })
}
