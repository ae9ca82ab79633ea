use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use shop_server::{
    config::Settings,
    services::{order_manager::EXPIRED_REASON, OrderManager},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::utils::{decimal_field, uuid_field, TestServer};

fn thirty_percent_deposit() -> Settings {
    Settings {
        default_deposit_percent: dec!(30),
        ..Default::default()
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_buyer_cancel_after_deposit_forfeits_it(pool: PgPool) {
    let server = TestServer::start_with_settings(pool, thirty_percent_deposit()).await;
    let product = server.create_product("LYO-40", "800.00", 4).await;

    let order = server.place_order(Uuid::new_v4(), &[(product, 3)]).await;
    let order_id = uuid_field(&order, "id");
    let (status, _) = server.pay(order_id, "deposit", "cs_lyo", dec!(720)).await;
    assert_eq!(status, 200);
    assert_eq!(server.product_stock(product).await, 1);

    let (status, body) = server
        .post(
            &format!("/api/v1/orders/{order_id}/cancel"),
            json!({ "reason": "budget withdrawn" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["refund_status"], "deposit_lost");
    assert_eq!(body["cancel_reason"], "budget withdrawn");
    assert_eq!(server.product_stock(product).await, 4);

    // A second cancel must not put the units back twice
    let (status, _) = server
        .post(&format!("/api/v1/orders/{order_id}/cancel"), json!({}))
        .await;
    assert_eq!(status, 409);
    assert_eq!(server.product_stock(product).await, 4);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cancel_unpaid_order_keeps_stock(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("HPLC-2", "1500.00", 2).await;

    let order = server.place_order(Uuid::new_v4(), &[(product, 2)]).await;
    let order_id = uuid_field(&order, "id");

    let (status, body) = server
        .post(&format!("/api/v1/orders/{order_id}/cancel"), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["refund_status"], "none");
    assert_eq!(server.product_stock(product).await, 2);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reject_paid_order_refunds_and_restocks(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("AUTO-9", "300.00", 10).await;

    let order = server.place_order(Uuid::new_v4(), &[(product, 5)]).await;
    let order_id = uuid_field(&order, "id");
    let (status, _) = server.pay(order_id, "deposit", "cs_auto", dec!(1500)).await;
    assert_eq!(status, 200);
    assert_eq!(server.product_stock(product).await, 5);

    let (status, body) = server
        .post(
            &format!("/api/v1/admin/orders/{order_id}/reject"),
            json!({ "reason": "export licence missing" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["approval_status"], "rejected");
    assert_eq!(body["status"], "refunded");
    assert_eq!(body["refund_status"], "deposit_refunded");
    assert_eq!(body["reject_reason"], "export licence missing");
    assert_eq!(server.product_stock(product).await, 10);

    // Rejected twice is a conflict
    let (status, _) = server
        .put(
            &format!("/api/v1/admin/orders/{order_id}/approval"),
            json!({ "approval_status": "rejected" }),
        )
        .await;
    assert_eq!(status, 409);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_refund_of_approved_order(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("MIX-3", "120.50", 6).await;

    let order = server.place_order(Uuid::new_v4(), &[(product, 2)]).await;
    let order_id = uuid_field(&order, "id");
    assert_eq!(decimal_field(&order, "total"), dec!(241.00));

    let (status, body) = server.pay(order_id, "deposit", "cs_mix", dec!(241)).await;
    assert_eq!(body["order"]["status"], "paid_in_full");
    assert_eq!(status, 200);
    let (status, _) = server
        .put(
            &format!("/api/v1/admin/orders/{order_id}/approval"),
            json!({ "approval_status": "approved" }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = server
        .post(
            &format!("/api/v1/admin/orders/{order_id}/refund"),
            json!({ "reason": "damaged in transit" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "refunded");
    assert_eq!(body["refund_status"], "deposit_refunded");
    assert_eq!(server.product_stock(product).await, 6);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expire_stale_pending_orders(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("DRY-7", "50.00", 8).await;

    let unpaid = server.place_order(Uuid::new_v4(), &[(product, 1)]).await;
    let paid = server.place_order(Uuid::new_v4(), &[(product, 1)]).await;
    let paid_id = uuid_field(&paid, "id");
    let (status, _) = server.pay(paid_id, "deposit", "cs_dry", dec!(50)).await;
    assert_eq!(status, 200);

    let manager = OrderManager::new(server.db.clone(), Arc::new(Settings::default()));
    let expired = manager
        .expire_stale_pending(chrono::Duration::zero())
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let (_, order) = server
        .get(&format!("/api/v1/orders/{}", uuid_field(&unpaid, "id")))
        .await;
    assert_eq!(order["status"], "cancelled");
    assert_eq!(order["cancel_reason"], EXPIRED_REASON);

    let (_, order) = server.get(&format!("/api/v1/orders/{paid_id}")).await;
    assert_eq!(order["status"], "paid_in_full");
    assert_eq!(server.product_stock(product).await, 7);

    // Nothing left to expire
    let expired = manager
        .expire_stale_pending(chrono::Duration::zero())
        .await
        .unwrap();
    assert_eq!(expired, 0);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_offline_payment_via_status_update(pool: PgPool) {
    let server = TestServer::start_with_settings(pool, thirty_percent_deposit()).await;
    let product = server.create_product("BAL-1", "900.00", 1).await;

    let order = server.place_order(Uuid::new_v4(), &[(product, 1)]).await;
    let order_id = uuid_field(&order, "id");

    let (status, body) = server
        .put(
            &format!("/api/v1/admin/orders/{order_id}/status"),
            json!({ "status": "Deposit Paid" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "deposit_paid");
    assert_eq!(decimal_field(&body, "amount_paid"), dec!(270));
    assert_eq!(
        body["payments"][0]["reference"],
        format!("manual:{}:deposit", order["order_number"].as_str().unwrap())
    );
    assert_eq!(server.product_stock(product).await, 0);

    // Back to pending is never allowed
    let (status, _) = server
        .put(
            &format!("/api/v1/admin/orders/{order_id}/status"),
            json!({ "status": "pending" }),
        )
        .await;
    assert_eq!(status, 409);
}
