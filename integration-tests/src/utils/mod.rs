use std::{sync::Arc, time::Duration};

use ctor::ctor;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shop_server::{
    config::Settings,
    db::Database,
    server::{build_router, AppState},
};
use sqlx::PgPool;
use tokio::{net::TcpListener, task::JoinSet};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const INTEGRATION_TEST_TIMEOUT_SECS: u64 = 10;

/// A running shop server on a random local port.
pub struct TestServer {
    pub base_url: String,
    pub db: Database,
    pub client: Client,
    // Dropping the set aborts the server task
    _tasks: JoinSet<()>,
}

impl TestServer {
    pub async fn start(pool: PgPool) -> Self {
        Self::start_with_settings(pool, Settings::default()).await
    }

    pub async fn start_with_settings(pool: PgPool, settings: Settings) -> Self {
        let db = Database::from_pool(pool)
            .await
            .expect("migrations should apply");
        let app = build_router(AppState::new(db.clone(), Arc::new(settings)));

        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("Should be able to bind to port");
        let port = listener
            .local_addr()
            .expect("Should have a local address")
            .port();

        let mut tasks = JoinSet::new();
        tasks.spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            db,
            client: Client::new(),
            _tasks: tasks,
        };
        server.wait_until_ready().await;
        server
    }

    async fn wait_until_ready(&self) {
        // Hit the status endpoint every 100ms until it returns 200
        let status_url = self.url("/status");
        let start_time = std::time::Instant::now();
        let timeout = Duration::from_secs(INTEGRATION_TEST_TIMEOUT_SECS);

        loop {
            assert!(
                start_time.elapsed() <= timeout,
                "Timeout waiting for shop server to become ready"
            );

            if let Ok(response) = self.client.get(&status_url).send().await {
                if response.status() == 200 {
                    break;
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        read(response).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        read(response).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        read(response).await
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        let response = self.client.delete(self.url(path)).send().await.unwrap();
        read(response).await
    }

    /// Create a product and return its id.
    pub async fn create_product(&self, sku: &str, price: &str, stock: u32) -> Uuid {
        let (status, body) = self
            .post(
                "/api/v1/products",
                json!({
                    "name": format!("Test equipment {sku}"),
                    "sku": sku,
                    "price": price,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(status, 201, "create product failed: {body}");
        uuid_field(&body, "id")
    }

    pub async fn product_stock(&self, product_id: Uuid) -> u64 {
        let (status, body) = self.get(&format!("/api/v1/products/{product_id}")).await;
        assert_eq!(status, 200);
        body["stock"].as_u64().unwrap()
    }

    /// Put products in a cart and check out, returning the order JSON.
    pub async fn place_order(&self, user_id: Uuid, lines: &[(Uuid, u32)]) -> Value {
        for (product_id, quantity) in lines {
            let (status, body) = self
                .put(
                    &format!("/api/v1/users/{user_id}/cart/{product_id}"),
                    json!({ "quantity": quantity }),
                )
                .await;
            assert_eq!(status, 200, "add to cart failed: {body}");
        }

        let (status, order) = self
            .post(
                &format!("/api/v1/users/{user_id}/checkout"),
                json!({
                    "shipping": {
                        "recipient_name": "Receiving dock 3",
                        "phone": "+1 555 0142",
                        "address": "400 Research Pkwy",
                        "company": "Northwind Pharma"
                    }
                }),
            )
            .await;
        assert_eq!(status, 201, "checkout failed: {order}");
        order
    }

    pub async fn pay(&self, order_id: Uuid, kind: &str, reference: &str, amount: Decimal) -> (u16, Value) {
        self.post(
            &format!("/api/v1/orders/{order_id}/payments"),
            json!({ "kind": kind, "reference": reference, "amount": amount.to_string() }),
        )
        .await
    }
}

async fn read(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    let json = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, json)
}

pub fn uuid_field(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("missing uuid field {field} in {body}"))
}

pub fn decimal_field(body: &Value, field: &str) -> Decimal {
    match &body[field] {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("field {field} is not a decimal: {other}"),
    }
}

#[ctor]
fn init_test_tracing() {
    let has_nocapture = std::env::args().any(|arg| arg == "--nocapture" || arg == "--show-output");
    if has_nocapture {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init()
            .ok();
    }
}
