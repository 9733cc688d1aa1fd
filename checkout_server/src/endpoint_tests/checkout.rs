use actix_web::http::StatusCode;
use checkout_engine::{
    db_types::Principal,
    test_utils::{fresh_database, seed_item, stock_of},
    traits::{ChargeInitiated, GatewayError, OrderManagement, PaymentGuidance, VerifiedPayment, VerifiedStatus},
};
use serde_json::json;
use shop_common::Pesewas;

use super::{
    helpers::{cart, checked_out, json, post_json, send, token_for, user_token},
    mocks::{accepting_gateway, verifying_as, MockGateway, SharedGateway},
};

#[actix_web::test]
async fn checkout_reserves_stock_and_prompts_the_payer() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "iPhone 13", Pesewas::from_cedis(120), 2).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let req = post_json("/api/checkout", &user_token("ama"), cart(phone, 1));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["amount"], 15_000);
    assert!(body["reference"].as_str().unwrap().starts_with(&format!("ord_{}_", body["order_id"])));
    assert_eq!(body["guidance"]["type"], "poll");
    assert_eq!(body["guidance"]["display_text"], "Approve the MoMo prompt on your phone. We'll confirm automatically.");
    assert_eq!(stock_of(&db, phone).await, 1);
}

#[actix_web::test]
async fn payments_are_tracked_by_the_provider_reference() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "iPhone 13", Pesewas::from_cedis(120), 2).await;
    let mut mock = MockGateway::new();
    mock.expect_provider_name().return_const("paystack".to_string());
    mock.expect_initiate().times(1).returning(|_| {
        let guidance = PaymentGuidance::default();
        Ok(ChargeInitiated { provider_reference: "T-4411".to_string(), guidance, raw: None })
    });
    mock.expect_verify()
        .withf(|reference| reference == "T-4411")
        .times(1)
        .returning(|reference| Ok(VerifiedPayment::new(reference, VerifiedStatus::Success)));
    let gateway = SharedGateway::new(mock);
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &user_token("ama"), cart(phone, 1))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["reference"], "T-4411");
    let payment = db.fetch_payment_by_reference("T-4411").await.unwrap().unwrap();
    assert_eq!(payment.customer_id, "ama");

    let req = post_json("/api/payments/verify", &user_token("ama"), json!({ "reference": "T-4411" }));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "success");
}

#[actix_web::test]
async fn checkout_needs_a_token() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "iPhone 13", Pesewas::from_cedis(120), 2).await;
    let gateway = SharedGateway::new(MockGateway::new());
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", "", cart(phone, 1))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body), json!({ "error": "Missing access token" }));
    let (status, _) = send(&db, &gateway, post_json("/api/checkout", "not.a.token", cart(phone, 1))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(stock_of(&db, phone).await, 2);
}

#[actix_web::test]
async fn blocked_customers_cannot_check_out() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "iPhone 13", Pesewas::from_cedis(120), 2).await;
    let gateway = SharedGateway::new(MockGateway::new());
    let token = token_for(&Principal::user("kofi").blocked());
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &token, cart(phone, 1))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body), json!({ "error": "Account blocked" }));
    assert_eq!(stock_of(&db, phone).await, 2);
}

#[actix_web::test]
async fn out_of_stock_items_are_named() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Galaxy S21", Pesewas::from_cedis(90), 1).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &user_token("ama"), cart(phone, 2))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error = json(&body)["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Out of stock"), "{error}");
    assert!(error.contains("Galaxy S21"), "{error}");
    assert_eq!(stock_of(&db, phone).await, 1);
}

#[actix_web::test]
async fn the_last_unit_goes_to_one_customer() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 1).await;
    let gateway = SharedGateway::new(accepting_gateway());
    let _ = checked_out(&db, &gateway, "ama", phone).await;
    let (status, _) = send(&db, &gateway, post_json("/api/checkout", &user_token("kofi"), cart(phone, 1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&db, phone).await, 0);
}

#[actix_web::test]
async fn bad_carts_are_rejected() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(MockGateway::new());
    let token = user_token("ama");
    let empty = json!({ "items": [], "phone": "0241234567" });
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &token, empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let (status, _) = send(&db, &gateway, post_json("/api/checkout", &token, cart(phone, 0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &token, json!({ "cart": "yes please" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].is_string());
    assert_eq!(stock_of(&db, phone).await, 3);
}

#[actix_web::test]
async fn gateway_outage_releases_the_reservation() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = MockGateway::new();
    mock.expect_provider_name().return_const("paystack".to_string());
    mock.expect_initiate().times(1).returning(|_| Err(GatewayError::Unavailable("connection reset".into())));
    let gateway = SharedGateway::new(mock);
    let (status, body) = send(&db, &gateway, post_json("/api/checkout", &user_token("ama"), cart(phone, 2))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Payment provider unavailable"));
    assert_eq!(stock_of(&db, phone).await, 3);
}

#[actix_web::test]
async fn polling_settles_the_payment_once() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().times(1).returning(|reference| Ok(VerifiedPayment::new(reference, VerifiedStatus::Success)));
    let gateway = SharedGateway::new(mock);
    let (_, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let token = user_token("ama");
    for _ in 0..2 {
        let req = post_json("/api/payments/verify", &token, json!({ "reference": reference }));
        let (status, body) = send(&db, &gateway, req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(json(&body), json!({ "reference": reference, "status": "success" }));
    }
    assert_eq!(stock_of(&db, phone).await, 2);
}

#[actix_web::test]
async fn pending_payments_stay_pending() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(verifying_as(accepting_gateway(), VerifiedStatus::Pending));
    let (_, reference) = checked_out(&db, &gateway, "ama", phone).await;
    let req = post_json("/api/payments/verify", &user_token("ama"), json!({ "reference": reference }));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "pending");
    assert_eq!(stock_of(&db, phone).await, 2);
}

#[actix_web::test]
async fn failed_payments_restore_stock() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let gateway = SharedGateway::new(verifying_as(accepting_gateway(), VerifiedStatus::Failed));
    let (_, reference) = checked_out(&db, &gateway, "ama", phone).await;
    assert_eq!(stock_of(&db, phone).await, 2);
    let req = post_json("/api/payments/verify", &user_token("ama"), json!({ "reference": reference }));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "failed");
    assert_eq!(stock_of(&db, phone).await, 3);
}

#[actix_web::test]
async fn polling_edge_cases() {
    let db = fresh_database().await;
    let phone = seed_item(&db, "Pixel 7", Pesewas::from_cedis(80), 3).await;
    let mut mock = accepting_gateway();
    mock.expect_verify().returning(|_| Err(GatewayError::Unavailable("timeout".into())));
    let gateway = SharedGateway::new(mock);
    let (_, reference) = checked_out(&db, &gateway, "ama", phone).await;

    let req = post_json("/api/payments/verify", &user_token("ama"), json!({ "reference": "  " }));
    let (status, body) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().ends_with("Missing reference"));

    let req = post_json("/api/payments/verify", &user_token("kofi"), json!({ "reference": reference }));
    let (status, _) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = post_json("/api/payments/verify", &user_token("ama"), json!({ "reference": reference }));
    let (status, _) = send(&db, &gateway, req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(stock_of(&db, phone).await, 2);
}
