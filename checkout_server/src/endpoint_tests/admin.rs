use actix_web::http::StatusCode;
use checkout_engine::{
    db_types::Principal,
    test_utils::{fresh_database, seed_item, stock_of},
};
use serde_json::json;
use shop_common::Pesewas;

use super::{
    helpers::{admin_token, checked_out, get, json, post_json, send, token_for, user_token},
    mocks::{accepting_gateway, MockGateway, SharedGateway},
};

#[actix_web::test]
async fn admin_routes_need_an_admin() {
    let db = fresh_database().await;
    let gateway = SharedGateway::new(MockGateway::new());
    let (status, body) = send(&db, &gateway, get("/api/admin/kpis", "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    let (status, body) = send(&db, &gateway, get("/api/admin/kpis", &user_token("ama"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body), json!({ "error": "Admin only" }));
    let blocked = token_for(&Principal::admin("boss").blocked());
    let (status, body) = send(&db, &gateway, get("/api/admin/orders", &blocked)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body), json!({ "error": "Account blocked" }));
    let req = post_json("/api/admin/settings/delivery_fee", &user_token("ama"), json!({ "delivery_fee_ghs": 1 }));
    let (status, _) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn kpis_and_listings() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (order_id, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let token = admin_token("boss");

    let (status, body) = send(&db, &gateway, get("/api/admin/kpis", &token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let kpis = json(&body);
    assert_eq!(kpis["total_orders"], 1);
    assert_eq!(kpis["pending_orders"], 1);
    assert_eq!(kpis["payment_count"], 1);

    let (status, body) = send(&db, &gateway, get("/api/admin/orders?status=pending", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 1);
    let (_, body) = send(&db, &gateway, get("/api/admin/orders?status=paid", &token)).await;
    assert!(json(&body).as_array().unwrap().is_empty());
    let (status, _) = send(&db, &gateway, get("/api/admin/orders?status=shipped", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/api/admin/orders/{}", order_id.value());
    let (status, body) = send(&db, &gateway, get(&path, &token)).await;
    assert_eq!(status, StatusCode::OK);
    let order = json(&body);
    assert_eq!(order["order"]["status"], "pending");
    assert_eq!(order["items"][0]["variant_label"], "Black • 128GB");
    assert_eq!(order["payment"]["reference"], reference.as_str());

    let (status, body) = send(&db, &gateway, get("/api/admin/payments", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["reference"], reference.as_str());
    let (status, body) = send(&db, &gateway, get(&format!("/api/admin/payments/{reference}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["order"]["id"], order_id.value());
    let (status, _) = send(&db, &gateway, get("/api/admin/payments/ord_404_1", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&db, &gateway, get("/api/admin/orders/404", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn status_overrides_follow_the_allowed_transitions() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (order_id, _) = checked_out(&db, &gateway, "ama", phone).await;
    let token = admin_token("boss");
    let path = format!("/api/admin/orders/{}/status", order_id.value());

    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "fulfilled" }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (status, _) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "lost" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "Paid" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "paid");
    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "fulfilled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "fulfilled");
    let (status, _) = send(&db, &gateway, post_json(&path, &token, json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    // Overrides never touch stock
    assert_eq!(stock_of(&db, phone).await, 2);
}

#[actix_web::test]
async fn cancelling_releases_stock_once() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (order_id, _) = checked_out(&db, &gateway, "ama", phone).await;
    assert_eq!(stock_of(&db, phone).await, 2);
    let token = admin_token("boss");
    let path = format!("/api/admin/orders/{}/cancel", order_id.value());

    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "failed");
    assert_eq!(stock_of(&db, phone).await, 3);

    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(stock_of(&db, phone).await, 3);
}

#[actix_web::test]
async fn tracking_notes_are_appended() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (order_id, _) = checked_out(&db, &gateway, "ama", phone).await;
    let token = admin_token("boss");
    let path = format!("/api/admin/orders/{}/notes", order_id.value());

    let note = json!({ "note": "Handed to rider", "label": "Dispatched" });
    let (status, body) = send(&db, &gateway, post_json(&path, &token, note)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (status, body) = send(&db, &gateway, post_json(&path, &token, json!({ "note": "Delivered" }))).await;
    assert_eq!(status, StatusCode::OK);
    let notes = json(&body);
    assert_eq!(notes.as_array().unwrap().len(), 2);
    assert_eq!(notes[0]["label"], "Dispatched");
    assert_eq!(notes[1]["note"], "Delivered");

    let (status, _) = send(&db, &gateway, post_json(&path, &token, json!({ "note": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delivery_fee_is_set_by_admins_and_used_at_checkout() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(accepting_gateway());

    let (status, body) = send(&db, &gateway, get("/settings/delivery_fee", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({ "delivery_fee": 3_000 }));

    let token = admin_token("boss");
    let req = post_json("/api/admin/settings/delivery_fee", &token, json!({ "delivery_fee_ghs": 12.5 }));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body), json!({ "delivery_fee": 1_250 }));
    let req = post_json("/api/admin/settings/delivery_fee", &token, json!({ "delivery_fee_ghs": -5 }));
    let (status, _) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&db, &gateway, get("/settings/delivery_fee", "")).await;
    assert_eq!(json(&body), json!({ "delivery_fee": 1_250 }));
    let req = post_json("/api/checkout", &user_token("ama"), super::helpers::cart(phone, 1));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["amount"], 9_250);
}
