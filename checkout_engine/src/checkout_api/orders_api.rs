use std::fmt::Debug;

use crate::{
    checkout_api::{
        errors::OrdersApiError,
        order_objects::{FullOrder, OrderQueryFilter, MAX_LIST_SIZE},
    },
    db_types::{Order, OrderId, Payment, Principal},
    traits::OrderManagement,
};

/// Read-only views of a customer's own orders and payments.
pub struct OrdersApi<B> {
    db: B,
}

impl<B> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi")
    }
}

impl<B> OrdersApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub async fn my_orders(&self, principal: &Principal) -> Result<Vec<Order>, OrdersApiError> {
        let query = OrderQueryFilter::default().with_customer_id(principal.id.as_str()).with_limit(MAX_LIST_SIZE);
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// The full order, if `principal` owns it or is an admin. Other people's orders are reported as missing.
    pub async fn my_order(&self, principal: &Principal, order_id: OrderId) -> Result<FullOrder, OrdersApiError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.customer_id == principal.id || principal.is_admin())
            .ok_or(OrdersApiError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        let tracking_notes = self.db.fetch_tracking_notes(order_id).await?;
        let payment = self.db.fetch_payment_for_order(order_id).await?;
        Ok(FullOrder { order, items, tracking_notes, payment })
    }

    pub async fn my_payments(&self, principal: &Principal) -> Result<Vec<Payment>, OrdersApiError> {
        let payments = self.db.fetch_payments(Some(principal.id.as_str()), MAX_LIST_SIZE).await?;
        Ok(payments)
    }
}
