use std::collections::HashMap;

use checkout_engine::{
    db_types::{Order, Pesewas, VariantId},
    events::EventProducers,
    payment_objects::CheckoutResult,
    test_utils::{create_database, random_db_path, run_migrations, FakeGateway},
    traits::OrderManagement,
    AdminApi,
    CheckoutFlowApi,
    SettlementApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct CheckoutWorld {
    pub system: Option<CheckoutSystem>,
}

#[derive(Debug)]
pub struct CheckoutSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub delivery_fee: Pesewas,
    /// Seeded variants, by title
    pub variants: HashMap<String, VariantId>,
    /// Successful checkouts, by customer
    pub checkouts: HashMap<String, CheckoutResult>,
    /// Failed actions, by customer (or "admin")
    pub errors: HashMap<String, String>,
}

impl CheckoutWorld {
    pub fn system(&self) -> &CheckoutSystem {
        self.system.as_ref().expect("Checkout system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut CheckoutSystem {
        self.system.as_mut().expect("Checkout system not initialised")
    }
}

impl CheckoutSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        Self {
            db_path: url,
            db,
            gateway: FakeGateway::new(),
            delivery_fee: Pesewas::from_cedis(30),
            variants: HashMap::new(),
            checkouts: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn checkout_api(&self) -> CheckoutFlowApi<SqliteDatabase, FakeGateway> {
        CheckoutFlowApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default())
    }

    pub fn settlement_api(&self) -> SettlementApi<SqliteDatabase, FakeGateway> {
        SettlementApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default())
    }

    pub fn admin_api(&self) -> AdminApi<SqliteDatabase> {
        AdminApi::new(self.db.clone(), EventProducers::default())
    }

    pub fn variant(&self, title: &str) -> VariantId {
        *self.variants.get(title).unwrap_or_else(|| panic!("No phone called {title} was seeded"))
    }

    pub fn checkout_of(&self, customer: &str) -> &CheckoutResult {
        self.checkouts.get(customer).unwrap_or_else(|| panic!("{customer} has not checked out"))
    }

    pub async fn order_of(&self, customer: &str) -> Order {
        let id = self.checkout_of(customer).order_id;
        self.db.fetch_order(id).await.expect("Error fetching order").expect("Order does not exist")
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
