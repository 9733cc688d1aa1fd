use thiserror::Error;

use crate::{
    checkout_api::order_objects::{OrderKpis, OrderQueryFilter},
    db_types::{Order, OrderId, OrderItem, Payment, TrackingNote, Variant, VariantId},
};

/// Read-only queries for orders, payments and the catalog.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderQueryError>;

    /// The frozen line items of the order, in the order they were reserved.
    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderQueryError>;

    /// The tracking history of the order, oldest first.
    async fn fetch_tracking_notes(&self, order_id: OrderId) -> Result<Vec<TrackingNote>, OrderQueryError>;

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, OrderQueryError>;

    async fn fetch_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>, OrderQueryError>;

    /// Fetches orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;

    /// Fetches payments, newest first. If `customer_id` is given, only that customer's payments are returned.
    async fn fetch_payments(&self, customer_id: Option<&str>, limit: i64) -> Result<Vec<Payment>, OrderQueryError>;

    async fn fetch_variant(&self, variant_id: VariantId) -> Result<Option<Variant>, OrderQueryError>;

    /// Sales and order counts for the admin dashboard. `low_stock_threshold` is inclusive.
    async fn fetch_kpis(&self, low_stock_threshold: i64) -> Result<OrderKpis, OrderQueryError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}
