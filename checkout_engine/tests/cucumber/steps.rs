use std::time::Duration;

use checkout_engine::{
    db_types::{CartItem, OrderStatusType, Pesewas, PaymentStatus, Principal},
    payment_objects::CheckoutRequest,
    test_utils::stock_of,
    traits::{OrderManagement, VerifiedStatus},
    CheckoutFlowError,
};
use cucumber::{then, when};

use crate::cucumber::CheckoutWorld;

fn request(world: &CheckoutWorld, quantity: i64, title: &str) -> CheckoutRequest {
    let variant = world.system().variant(title);
    CheckoutRequest { items: vec![CartItem::new(variant, quantity)], phone: "0240000001".into(), email: None }
}

fn record(world: &mut CheckoutWorld, customer: String, result: Result<checkout_engine::payment_objects::CheckoutResult, CheckoutFlowError>) {
    let system = world.system_mut();
    match result {
        Ok(checkout) => {
            system.checkouts.insert(customer, checkout);
        },
        Err(e) => {
            system.errors.insert(customer, e.to_string());
        },
    }
}

#[when(expr = "'{word}' checks out {int} of '{word}'")]
async fn check_out(world: &mut CheckoutWorld, customer: String, quantity: i64, title: String) {
    let req = request(world, quantity, &title);
    let system = world.system();
    let result = system.checkout_api().checkout(&Principal::user(customer.as_str()), req, system.delivery_fee).await;
    record(world, customer, result);
}

#[when(expr = "'{word}' and '{word}' each check out {int} of '{word}' at the same time")]
async fn check_out_together(world: &mut CheckoutWorld, first: String, second: String, quantity: i64, title: String) {
    let system = world.system();
    let fee = system.delivery_fee;
    let (api_a, api_b) = (system.checkout_api(), system.checkout_api());
    let (req_a, req_b) = (request(world, quantity, &title), request(world, quantity, &title));
    let (user_a, user_b) = (Principal::user(first.as_str()), Principal::user(second.as_str()));
    let (a, b) = tokio::join!(
        tokio::spawn(async move { api_a.checkout(&user_a, req_a, fee).await }),
        tokio::spawn(async move { api_b.checkout(&user_b, req_b, fee).await }),
    );
    record(world, first, a.expect("Checkout task panicked"));
    record(world, second, b.expect("Checkout task panicked"));
}

#[when(expr = "the provider confirms {word} for the payment of '{word}'")]
async fn provider_verdict(world: &mut CheckoutWorld, verdict: String, customer: String) {
    let system = world.system();
    let reference = system.checkout_of(&customer).reference.clone();
    let status = match verdict.as_str() {
        "success" => VerifiedStatus::Success,
        "failed" => VerifiedStatus::Failed,
        _ => VerifiedStatus::Pending,
    };
    system.gateway.set_verdict(&reference, status);
    system.settlement_api().verify_and_settle(&reference).await.expect("Error settling payment");
}

#[when(expr = "a delayed webhook claims {word} for the payment of '{word}'")]
async fn delayed_webhook(world: &mut CheckoutWorld, verdict: String, customer: String) {
    let system = world.system();
    let reference = system.checkout_of(&customer).reference.clone();
    let status = verdict.parse::<PaymentStatus>().expect("Not a payment status");
    system.settlement_api().settle(&reference, status, None).await.expect("Error settling payment");
}

#[when(expr = "the admin cancels the order of '{word}'")]
async fn admin_cancels(world: &mut CheckoutWorld, customer: String) {
    let system = world.system();
    let order_id = system.checkout_of(&customer).order_id;
    let result = system.admin_api().cancel(&Principal::admin("admin"), order_id).await;
    if let Err(e) = result {
        world.system_mut().errors.insert("admin".into(), e.to_string());
    }
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut CheckoutWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the order of '{word}' is {word}")]
async fn order_status(world: &mut CheckoutWorld, customer: String, status: String) {
    let order = world.system().order_of(&customer).await;
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "the order of '{word}' totals {int} GHS")]
async fn order_total(world: &mut CheckoutWorld, customer: String, total: i64) {
    let order = world.system().order_of(&customer).await;
    assert_eq!(order.total, Pesewas::from_cedis(total), "Total is incorrect");
}

#[then(expr = "the payment of '{word}' is {word}")]
async fn payment_status(world: &mut CheckoutWorld, customer: String, status: String) {
    let system = world.system();
    let reference = &system.checkout_of(&customer).reference;
    let payment = system
        .db
        .fetch_payment_by_reference(reference)
        .await
        .expect("Error fetching payment")
        .expect("Payment does not exist");
    let expected = status.parse::<PaymentStatus>().expect("Not a payment status");
    assert_eq!(payment.status, expected, "Payment status is incorrect");
}

#[then(expr = "'{word}' has {int} in stock")]
async fn stock_level(world: &mut CheckoutWorld, title: String, stock: i64) {
    let system = world.system();
    assert_eq!(stock_of(&system.db, system.variant(&title)).await, stock, "Stock is incorrect");
}

#[then(expr = "exactly {int} order(s) exist(s)")]
async fn order_count(world: &mut CheckoutWorld, count: usize) {
    let orders = world.system().db.search_orders(Default::default()).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count, "Order count is incorrect");
}

#[then(expr = "one of '{word}' or '{word}' was told the phone is out of stock")]
async fn one_loser(world: &mut CheckoutWorld, first: String, second: String) {
    let system = world.system();
    let winners = [&first, &second].iter().filter(|c| system.checkouts.contains_key(c.as_str())).count();
    assert_eq!(winners, 1, "Exactly one checkout should succeed");
    let loser = if system.checkouts.contains_key(&first) { &second } else { &first };
    let error = system.errors.get(loser).expect("The losing checkout recorded no error");
    assert!(error.starts_with("Out of stock") || error.starts_with("Stock changed"), "Unexpected error: {error}");
}

#[then(expr = "the last admin action was rejected with {string}")]
async fn admin_rejected(world: &mut CheckoutWorld, message: String) {
    let error = world.system().errors.get("admin").expect("No admin action was rejected");
    assert!(error.contains(&message), "Unexpected error: {error}");
}
