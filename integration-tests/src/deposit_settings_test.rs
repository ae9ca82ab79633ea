use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::{decimal_field, uuid_field, TestServer};

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_overlapping_ranges_are_rejected(pool: PgPool) {
    let server = TestServer::start(pool).await;

    let (status, small) = server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "0", "max_total": "5000", "percent": "50" }),
        )
        .await;
    assert_eq!(status, 201, "{small}");

    let (status, _) = server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "5000.01", "percent": "20" }),
        )
        .await;
    assert_eq!(status, 201);

    // Bounds are inclusive, so 5000 is already taken
    let (status, body) = server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "5000", "max_total": "9000", "percent": "40" }),
        )
        .await;
    assert_eq!(status, 409, "{body}");

    // Inactive rows may overlap
    let (status, _) = server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "1000", "max_total": "2000", "percent": "10", "is_active": false }),
        )
        .await;
    assert_eq!(status, 201);

    let (_, active) = server.get("/api/v1/deposit-settings").await;
    assert_eq!(active.as_array().unwrap().len(), 2);
    let (_, all) = server.get("/api/v1/admin/deposit-settings").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    // Updating a row in place does not conflict with itself
    let small_id = uuid_field(&small, "id");
    let (status, body) = server
        .put(
            &format!("/api/v1/admin/deposit-settings/{small_id}"),
            json!({ "min_total": "0", "max_total": "5000", "percent": "35" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(decimal_field(&body, "percent"), dec!(35));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_quote_follows_schedule(pool: PgPool) {
    let server = TestServer::start(pool).await;

    server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "0", "max_total": "999.99", "percent": "100" }),
        )
        .await;
    server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "1000", "percent": "25" }),
        )
        .await;

    let (status, quote) = server.get("/api/v1/deposit-settings/quote?total=500").await;
    assert_eq!(status, 200);
    assert_eq!(decimal_field(&quote, "deposit_amount"), dec!(500));

    let (_, quote) = server
        .get("/api/v1/deposit-settings/quote?total=4321.50")
        .await;
    assert_eq!(decimal_field(&quote, "percent"), dec!(25));
    assert_eq!(decimal_field(&quote, "deposit_amount"), dec!(1080.38));
    assert_eq!(decimal_field(&quote, "balance"), dec!(3241.12));

    // Checkout snapshots the percent in force at the time
    let product = server.create_product("REACT-5", "2000.00", 3).await;
    let order = server.place_order(Uuid::new_v4(), &[(product, 1)]).await;
    assert_eq!(decimal_field(&order, "deposit_percent"), dec!(25));
    assert_eq!(decimal_field(&order, "deposit_amount"), dec!(500));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_setting_falls_back_to_default(pool: PgPool) {
    let server = TestServer::start(pool).await;

    let (_, setting) = server
        .post(
            "/api/v1/admin/deposit-settings",
            json!({ "min_total": "0", "percent": "10" }),
        )
        .await;
    let setting_id = uuid_field(&setting, "id");

    let (status, _) = server
        .delete(&format!("/api/v1/admin/deposit-settings/{setting_id}"))
        .await;
    assert_eq!(status, 204);

    let (_, quote) = server.get("/api/v1/deposit-settings/quote?total=80").await;
    assert_eq!(decimal_field(&quote, "percent"), dec!(100));

    let (status, _) = server
        .delete(&format!("/api/v1/admin/deposit-settings/{setting_id}"))
        .await;
    assert_eq!(status, 404);
}
