use cucumber::given;
use checkout_engine::{db_types::Pesewas, test_utils::seed_item};

use crate::cucumber::{CheckoutSystem, CheckoutWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CheckoutWorld) {
    let system = CheckoutSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a phone '{word}' with {int} in stock at {int} GHS")]
async fn seed_phone(world: &mut CheckoutWorld, title: String, stock: i64, price: i64) {
    let system = world.system_mut();
    let variant = seed_item(&system.db, &title, Pesewas::from_cedis(price), stock).await;
    system.variants.insert(title, variant);
}

#[given(expr = "the delivery fee is {int} GHS")]
async fn delivery_fee(world: &mut CheckoutWorld, fee: i64) {
    world.system_mut().delivery_fee = Pesewas::from_cedis(fee);
}
