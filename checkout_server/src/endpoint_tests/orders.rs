use actix_web::http::StatusCode;
use checkout_engine::test_utils::{fresh_database, seed_item};
use shop_common::Pesewas;

use super::{
    helpers::{admin_token, checked_out, get, json, send, user_token},
    mocks::{accepting_gateway, SharedGateway},
};

#[actix_web::test]
async fn customers_see_only_their_own_orders() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 5).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (amas_order, amas_reference) = checked_out(&db, &gateway, "ama", phone).await;
    let (kofis_order, _) = checked_out(&db, &gateway, "kofi", phone).await;
    let token = user_token("ama");

    let (status, body) = send(&db, &gateway, get("/api/orders", &token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let orders = json(&body);
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["id"], amas_order.value());
    assert_eq!(orders[0]["total"], 11_000);
    assert_eq!(orders[0]["currency"], "GHS");

    let (status, body) = send(&db, &gateway, get(&format!("/api/orders/{}", amas_order.value()), &token)).await;
    assert_eq!(status, StatusCode::OK);
    let order = json(&body);
    assert_eq!(order["order"]["customer_id"], "ama");
    assert_eq!(order["items"][0]["quantity"], 1);
    assert_eq!(order["items"][0]["unit_price"], 8_000);

    let (status, _) = send(&db, &gateway, get(&format!("/api/orders/{}", kofis_order.value()), &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&db, &gateway, get("/api/orders/not-a-number", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&db, &gateway, get("/api/payments", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let payments = json(&body);
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["reference"], amas_reference.as_str());
    assert_eq!(payments[0]["status"], "initiated");
}

#[actix_web::test]
async fn admins_can_open_any_order() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 5).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (order_id, _) = checked_out(&db, &gateway, "kofi", phone).await;
    let path = format!("/api/orders/{}", order_id.value());
    let (status, body) = send(&db, &gateway, get(&path, &admin_token("boss"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["order"]["customer_id"], "kofi");
    let (status, _) = send(&db, &gateway, get("/api/orders", "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
