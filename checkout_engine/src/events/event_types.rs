use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Payment};

/// Emitted once, by whichever caller performed the terminal `Success` write for the order's payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Option<Payment>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Option<Payment>) -> Self {
        Self { order, payment }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnulmentReason {
    /// The provider reported that the payment failed.
    PaymentFailed,
    /// The gateway could not start the charge, so the reservation was rolled back.
    GatewayUnavailable,
    /// An admin cancelled the order.
    Cancelled,
    /// The order sat unpaid for too long.
    Expired,
}

/// Emitted when a pending order ends up `Failed` and its reservation has been released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub reason: AnnulmentReason,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order, reason: AnnulmentReason) -> Self {
        Self { order, reason }
    }
}

/// Emitted after an admin moves an order between statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModifiedEvent {
    pub old_status: OrderStatusType,
    pub new_order: Order,
}

impl OrderModifiedEvent {
    pub fn new(old_status: OrderStatusType, new_order: Order) -> Self {
        Self { old_status, new_order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderAnnulled(OrderAnnulledEvent),
    OrderModified(OrderModifiedEvent),
}
