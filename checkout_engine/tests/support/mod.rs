#![allow(dead_code)]
use checkout_engine::{
    db_types::{CartItem, Order, OrderId, Pesewas, Principal, VariantId},
    events::EventProducers,
    payment_objects::{CheckoutRequest, CheckoutResult},
    test_utils::{fresh_database, seed_item, FakeGateway},
    traits::{CheckoutDatabase, OrderManagement},
    AdminApi,
    CheckoutFlowApi,
    ReservationApi,
    SettlementApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn delivery_fee() -> Pesewas {
    Pesewas::from_cedis(30)
}

pub fn cart(variant_id: VariantId, quantity: i64) -> CheckoutRequest {
    CheckoutRequest { items: vec![CartItem::new(variant_id, quantity)], phone: "0240000001".into(), email: None }
}

/// A migrated database, a scripted gateway and the APIs wired to both.
pub struct Shop {
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub producers: EventProducers,
}

impl Shop {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let db = fresh_database().await;
        Self { db, gateway: FakeGateway::new(), producers }
    }

    pub fn reservations(&self) -> ReservationApi<SqliteDatabase> {
        ReservationApi::new(self.db.clone())
    }

    pub fn checkout_api(&self) -> CheckoutFlowApi<SqliteDatabase, FakeGateway> {
        CheckoutFlowApi::new(self.db.clone(), self.gateway.clone(), self.producers.clone())
    }

    pub fn settlement_api(&self) -> SettlementApi<SqliteDatabase, FakeGateway> {
        SettlementApi::new(self.db.clone(), self.gateway.clone(), self.producers.clone())
    }

    pub fn admin_api(&self) -> AdminApi<SqliteDatabase> {
        AdminApi::new(self.db.clone(), self.producers.clone())
    }

    /// Seeds a phone at GH₵60.00 with the given stock.
    pub async fn seed_phone(&self, stock: i64) -> VariantId {
        seed_item(&self.db, "Tecno Spark 20", Pesewas::from_cedis(60), stock).await
    }

    pub async fn checkout(&self, customer: &str, variant_id: VariantId, quantity: i64) -> CheckoutResult {
        self.checkout_api()
            .checkout(&Principal::user(customer), cart(variant_id, quantity), delivery_fee())
            .await
            .expect("Checkout failed")
    }

    pub async fn order(&self, order_id: OrderId) -> Order {
        self.db.fetch_order(order_id).await.expect("Error fetching order").expect("Order does not exist")
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Failed to remove test database {url}: {e}");
        }
    }
}
