//! `SqliteDatabase` is a concrete implementation of a checkout engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! Every write transaction opens with a write statement. That way SQLite takes the write lock up front and a second
//! writer waits on the busy timeout, instead of both holding read locks and one failing its upgrade.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use shop_common::Pesewas;
use sqlx::{migrate, SqlitePool};

use super::db::{catalog, db_url, new_pool, orders, payments, settings};
use crate::{
    checkout_api::order_objects::{OrderKpis, OrderQueryFilter},
    db_types::{
        CatalogItem,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        TrackingNote,
        Variant,
        VariantId,
    },
    traits::{
        CheckoutDatabase,
        CheckoutDatabaseError,
        OrderManagement,
        OrderQueryError,
        SettingsError,
        SettingsManagement,
        SettlementOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CHECKOUT_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool for {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    async fn fetch_existing_order(
        &self,
        order_id: OrderId,
        conn: &mut sqlx::SqliteConnection,
    ) -> Result<Order, CheckoutDatabaseError> {
        orders::fetch_order(order_id, conn).await?.ok_or(CheckoutDatabaseError::OrderNotFound(order_id))
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_catalog_item(&self, variant_id: VariantId) -> Result<Option<CatalogItem>, CheckoutDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let item = catalog::fetch_catalog_item(variant_id, &mut conn).await?;
        Ok(item)
    }

    async fn reserve_stock_and_insert_order(&self, order: NewOrder) -> Result<Order, CheckoutDatabaseError> {
        let mut tx = self.pool.begin().await?;
        for item in &order.items {
            if !catalog::try_decrement_stock(item.variant_id, item.quantity, &mut tx).await? {
                debug!("🗃️ Reservation for {} refused. Rolling back the whole cart.", item.variant_id);
                // Dropping the transaction rolls back any decrements already made for this cart
                return Err(CheckoutDatabaseError::StockRaceDetected(item.variant_id));
            }
        }
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn insert_payment_for_order(&self, payment: NewPayment) -> Result<(Order, Payment), CheckoutDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let order_id = payment.order_id;
        let reference = payment.reference.clone();
        let payment = match payments::insert_payment(payment, &mut tx).await {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(CheckoutDatabaseError::PaymentAlreadyExists(reference));
            },
            result => result?,
        };
        let order = match orders::link_payment(order_id, payment.id, &mut tx).await? {
            Some(order) => order,
            None => {
                let _ = self.fetch_existing_order(order_id, &mut tx).await?;
                return Err(CheckoutDatabaseError::OrderAlreadyHasPayment(order_id));
            },
        };
        tx.commit().await?;
        debug!("🗃️ Payment [{reference}] is linked to order {order_id}");
        Ok((order, payment))
    }

    async fn settle_payment(
        &self,
        reference: &str,
        status: PaymentStatus,
        raw_payload: Option<String>,
    ) -> Result<SettlementOutcome, CheckoutDatabaseError> {
        if !status.is_terminal() {
            return Err(CheckoutDatabaseError::NonTerminalSettlement(status));
        }
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::try_settle_payment(reference, status, raw_payload, &mut tx).await? else {
            let existing = payments::fetch_payment_by_reference(reference, &mut tx).await?;
            return Ok(match existing {
                Some(payment) => SettlementOutcome::AlreadySettled { payment },
                None => SettlementOutcome::UnknownReference,
            });
        };
        let order_id = payment.order_id;
        let order = if status == PaymentStatus::Success {
            match orders::transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Paid, &mut tx).await? {
                Some(order) => order,
                None => {
                    let order = self.fetch_existing_order(order_id, &mut tx).await?;
                    if order.status == OrderStatusType::Failed {
                        warn!(
                            "🗃️ Payment [{reference}] succeeded, but order {order_id} had already failed and its stock \
                             was released. This payment requires a manual refund."
                        );
                    } else {
                        info!("🗃️ Payment [{reference}] succeeded. Order {order_id} was already {}", order.status);
                    }
                    order
                },
            }
        } else {
            let failed =
                orders::transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Failed, &mut tx).await?;
            let order = match failed {
                Some(order) => order,
                None => self.fetch_existing_order(order_id, &mut tx).await?,
            };
            if order.status == OrderStatusType::Failed {
                if orders::release_reservation(order_id, &mut tx).await? {
                    self.fetch_existing_order(order_id, &mut tx).await?
                } else {
                    order
                }
            } else {
                warn!(
                    "🗃️ Payment [{reference}] failed, but order {order_id} is already {}. Leaving the order as it is.",
                    order.status
                );
                order
            }
        };
        tx.commit().await?;
        Ok(SettlementOutcome::Settled { payment, order })
    }

    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, CheckoutDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let cancelled =
            orders::transition_status(order_id, OrderStatusType::Pending, OrderStatusType::Failed, &mut tx).await?;
        if cancelled.is_none() {
            let order = self.fetch_existing_order(order_id, &mut tx).await?;
            return Err(CheckoutDatabaseError::IllegalStateTransition {
                order_id,
                from: order.status,
                to: OrderStatusType::Failed,
            });
        }
        orders::release_reservation(order_id, &mut tx).await?;
        let order = self.fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} cancelled");
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, CheckoutDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::transition_status(order_id, from, to, &mut tx).await? else {
            let order = self.fetch_existing_order(order_id, &mut tx).await?;
            return Err(CheckoutDatabaseError::IllegalStateTransition { order_id, from: order.status, to });
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn add_tracking_note(
        &self,
        order_id: OrderId,
        note: &str,
        label: Option<&str>,
    ) -> Result<Vec<TrackingNote>, CheckoutDatabaseError> {
        let mut tx = self.pool.begin().await?;
        if orders::insert_tracking_note(order_id, note, label, &mut tx).await?.is_none() {
            return Err(CheckoutDatabaseError::OrderNotFound(order_id));
        }
        let notes = orders::fetch_tracking_notes(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(notes)
    }

    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, CheckoutDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_stale_pending_orders(older_than, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), CheckoutDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_tracking_notes(&self, order_id: OrderId) -> Result<Vec<TrackingNote>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let notes = orders::fetch_tracking_notes(order_id, &mut conn).await?;
        Ok(notes)
    }

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_reference(reference, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_payments(&self, customer_id: Option<&str>, limit: i64) -> Result<Vec<Payment>, OrderQueryError> {
        if limit <= 0 {
            return Err(OrderQueryError::QueryError(format!("Invalid limit: {limit}")));
        }
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments(customer_id, limit, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_variant(&self, variant_id: VariantId) -> Result<Option<Variant>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let variant = catalog::fetch_variant(variant_id, &mut conn).await?;
        Ok(variant)
    }

    async fn fetch_kpis(&self, low_stock_threshold: i64) -> Result<OrderKpis, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let mut kpis = orders::fetch_order_kpis(&mut conn).await?;
        kpis.payment_count = payments::count_payments(&mut conn).await?;
        kpis.low_stock_variants = catalog::count_low_stock(low_stock_threshold, &mut conn).await?;
        Ok(kpis)
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_delivery_fee(&self) -> Result<Option<Pesewas>, SettingsError> {
        let mut conn = self.pool.acquire().await?;
        let fee = settings::fetch_delivery_fee(&mut conn).await?;
        Ok(fee)
    }

    async fn set_delivery_fee(&self, fee: Pesewas) -> Result<Pesewas, SettingsError> {
        if fee.is_negative() {
            return Err(SettingsError::InvalidValue(format!("Delivery fee cannot be negative: {fee}")));
        }
        let mut tx = self.pool.begin().await?;
        let fee = settings::upsert_delivery_fee(fee, &mut tx).await?;
        tx.commit().await?;
        Ok(fee)
    }
}
