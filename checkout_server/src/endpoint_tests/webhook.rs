use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
};
use checkout_engine::{
    db_types::{OrderId, OrderStatusType, Principal},
    test_utils::{fresh_database, seed_item, stock_of},
    traits::{GatewayError, VerifiedPayment, VerifiedStatus},
    OrdersApi,
    SqliteDatabase,
};
use serde_json::json;
use shop_common::Pesewas;

use super::{
    helpers::{checked_out, json, send, sign_webhook},
    mocks::{accepting_gateway, MockGateway, SharedGateway},
};
use crate::middleware::PAYSTACK_SIGNATURE_HEADER;

fn webhook(body: &str, signature: Option<&str>) -> TestRequest {
    let req = TestRequest::post().uri("/paystack/webhook").insert_header(ContentType::json()).set_payload(body.to_string());
    match signature {
        Some(sig) => req.insert_header((PAYSTACK_SIGNATURE_HEADER, sig.to_string())),
        None => req,
    }
}

fn charge_event(event: &str, reference: &str) -> String {
    json!({ "event": event, "data": { "reference": reference, "status": "success", "amount": 11_000 } }).to_string()
}

async fn order_status(db: &SqliteDatabase, customer: &str, order_id: OrderId) -> OrderStatusType {
    let order = OrdersApi::new(db.clone()).my_order(&Principal::user(customer), order_id).await.unwrap();
    order.order.status
}

#[actix_web::test]
async fn signed_webhook_settles_with_the_verified_status() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().times(1).returning(|r| Ok(VerifiedPayment::new(r, VerifiedStatus::Success)));
    let gateway = SharedGateway::new(mock);
    let (order_id, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let body = charge_event("charge.success", &reference);
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(json(&response)["success"], true);
    assert_eq!(order_status(&db, "ama", order_id).await, OrderStatusType::Paid);
    assert_eq!(stock_of(&db, phone).await, 2);

    // Paystack redelivers. The payment is already terminal, so the provider is not asked again.
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&response)["message"], "Payment was already settled as Success.");
    assert_eq!(order_status(&db, "ama", order_id).await, OrderStatusType::Paid);
}

#[actix_web::test]
async fn event_status_is_never_trusted() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().times(1).returning(|r| Ok(VerifiedPayment::new(r, VerifiedStatus::Failed)));
    let gateway = SharedGateway::new(mock);
    let (order_id, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let body = charge_event("charge.success", &reference);
    let (status, _) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, "ama", order_id).await, OrderStatusType::Failed);
    assert_eq!(stock_of(&db, phone).await, 3);
}

#[actix_web::test]
async fn bad_signatures_are_rejected_before_parsing() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().never();
    let gateway = SharedGateway::new(mock);
    let (order_id, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let body = charge_event("charge.success", &reference);

    let (status, response) = send(&db, &gateway, webhook(&body, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&response), json!({ "error": "Invalid signature" }));

    let forged = sign_webhook(&charge_event("charge.success", "ord_1_1"));
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&response), json!({ "error": "Invalid signature" }));

    let (status, _) = send(&db, &gateway, webhook(&body, Some("definitely-not-hex"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Not even JSON, but the signature check comes first
    let (status, _) = send(&db, &gateway, webhook("{{{", Some("00ff"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(order_status(&db, "ama", order_id).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn unactionable_events_are_acknowledged() {
    let db = fresh_database().await;
    let mut mock = MockGateway::new();
    mock.expect_verify().never();
    let gateway = SharedGateway::new(mock);

    let body = "this is not json";
    let (status, response) = send(&db, &gateway, webhook(body, Some(&sign_webhook(body)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&response)["error"].is_string());

    let body = json!({ "event": "transfer.success", "data": { "amount": 100 } }).to_string();
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&response)["success"], true);

    let body = charge_event("charge.success", "ord_999_1700000000000");
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&response)["message"], "Event ignored. Unknown reference.");
}

#[actix_web::test]
async fn gateway_outage_is_acknowledged_without_settling() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().returning(|_| Err(GatewayError::Unavailable("timeout".into())));
    let gateway = SharedGateway::new(mock);
    let (order_id, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let body = charge_event("charge.success", &reference);
    let (status, response) = send(&db, &gateway, webhook(&body, Some(&sign_webhook(&body)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&response)["success"], false);
    assert_eq!(order_status(&db, "ama", order_id).await, OrderStatusType::Pending);
    assert_eq!(stock_of(&db, phone).await, 2);
}
