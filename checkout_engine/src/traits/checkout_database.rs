use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{
        CatalogItem,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentStatus,
        TrackingNote,
        VariantId,
    },
    traits::{
        data_objects::SettlementOutcome,
        OrderManagement,
        OrderQueryError,
        SettingsError,
        SettingsManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the checkout engine.
///
/// Every method that changes state is a single atomic unit in the backend. Implementations must use conditional
/// updates (or an equivalent serialising scope) so that concurrent callers cannot oversell stock, settle a payment
/// twice, or restore the same reservation twice.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone + OrderManagement + SettingsManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches a variant together with its product, as the checkout sees it.
    async fn fetch_catalog_item(&self, variant_id: VariantId) -> Result<Option<CatalogItem>, CheckoutDatabaseError>;

    /// Reserves stock for every item in the order and stores the order, in a single atomic transaction.
    ///
    /// For each item, stock is decremented only if the variant is still active and has at least the requested
    /// quantity. If any item fails that check, nothing is written and
    /// [`CheckoutDatabaseError::StockRaceDetected`] is returned with the offending variant.
    ///
    /// The new order has status `Pending` and `stock_reserved = true`.
    async fn reserve_stock_and_insert_order(&self, order: NewOrder) -> Result<Order, CheckoutDatabaseError>;

    /// Stores a new payment in `Initiated` status and links it to its order, in a single atomic transaction.
    ///
    /// Fails if the reference already exists, or if the order already has a payment.
    async fn insert_payment_for_order(&self, payment: NewPayment) -> Result<(Order, Payment), CheckoutDatabaseError>;

    /// Applies a verified terminal status to the payment with the given reference.
    ///
    /// * Unknown references return [`SettlementOutcome::UnknownReference`].
    /// * Payments that are already terminal return [`SettlementOutcome::AlreadySettled`] and nothing is changed. The
    ///   first terminal write wins.
    /// * `Success` moves a `Pending` order to `Paid`. Stock is not touched.
    /// * `Failed` moves a `Pending` order to `Failed` and, if the order still holds its reservation, restores the stock.
    ///
    /// The payment write, order write and stock restoration happen in one transaction.
    async fn settle_payment(
        &self,
        reference: &str,
        status: PaymentStatus,
        raw_payload: Option<String>,
    ) -> Result<SettlementOutcome, CheckoutDatabaseError>;

    /// Moves a `Pending` order to `Failed` and restores its reserved stock, in a single atomic transaction.
    ///
    /// Orders in any other status are rejected with [`CheckoutDatabaseError::IllegalStateTransition`].
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, CheckoutDatabaseError>;

    /// Changes the order status from `from` to `to`, but only if the order is still in `from`. This has no inventory
    /// effect. Validating that the transition makes sense is the caller's job.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, CheckoutDatabaseError>;

    /// Appends a note to the order's tracking history and returns the full history, oldest first.
    async fn add_tracking_note(
        &self,
        order_id: OrderId,
        note: &str,
        label: Option<&str>,
    ) -> Result<Vec<TrackingNote>, CheckoutDatabaseError>;

    /// Fetches `Pending` orders that have not been updated for longer than `older_than`.
    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, CheckoutDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutDatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutDatabaseError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Stock for {0} changed while the order was being reserved.")]
    StockRaceDetected(VariantId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert payment, since it already exists with reference {0}")]
    PaymentAlreadyExists(String),
    #[error("Order {0} already has a payment attached")]
    OrderAlreadyHasPayment(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalStateTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("A payment can only be settled as Success or Failed, not {0}")]
    NonTerminalSettlement(PaymentStatus),
    #[error("{0}")]
    QueryError(#[from] OrderQueryError),
    #[error("{0}")]
    SettingsError(#[from] SettingsError),
}

impl From<sqlx::Error> for CheckoutDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutDatabaseError::DatabaseError(e.to_string())
    }
}
