use chrono::{DateTime, Utc};

use crate::db_types::OrderId;

/// Builds the idempotency key for a payment attempt: `ord_{orderId}_{unixMillis}`.
pub fn payment_reference(order_id: OrderId, at: DateTime<Utc>) -> String {
    format!("ord_{}_{}", order_id.value(), at.timestamp_millis())
}

/// Recovers the order id from a reference built by [`payment_reference`]. This is only a hint for logging; the
/// payments table is the source of truth for which order a reference belongs to.
pub fn order_id_from_reference(reference: &str) -> Option<OrderId> {
    let mut parts = reference.strip_prefix("ord_")?.splitn(2, '_');
    let id = parts.next()?.parse::<i64>().ok()?;
    parts.next()?.parse::<i64>().ok()?;
    Some(OrderId(id))
}
