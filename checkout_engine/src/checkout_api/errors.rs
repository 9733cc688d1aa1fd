use shop_common::Pesewas;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentStatus, VariantId},
    traits::{CheckoutDatabaseError, GatewayError, OrderQueryError, SettingsError},
};

#[derive(Debug, Clone, Error)]
pub enum ReservationError {
    #[error("Account blocked")]
    PrincipalBlocked,
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Invalid quantity {1} for {0}")]
    InvalidQuantity(VariantId, i64),
    #[error("Invalid delivery fee: {0}")]
    InvalidDeliveryFee(Pesewas),
    #[error("A mobile-money phone number is required")]
    MissingPhone,
    #[error("Invalid item: {0} does not exist or is not for sale")]
    InvalidItem(VariantId),
    #[error("Out of stock: {item}")]
    InsufficientStock { item: String, requested: i64, available: i64 },
    #[error("Stock changed. Please refresh cart and try again.")]
    StockRaceDetected(VariantId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ReservationError {
    /// True for both the up-front stock check and a race lost inside the reservation transaction.
    pub fn is_out_of_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. } | Self::StockRaceDetected(_))
    }
}

impl From<CheckoutDatabaseError> for ReservationError {
    fn from(e: CheckoutDatabaseError) -> Self {
        match e {
            CheckoutDatabaseError::StockRaceDetected(v) => Self::StockRaceDetected(v),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutFlowError {
    #[error("{0}")]
    Reservation(#[from] ReservationError),
    #[error("Payment provider unavailable. Please try again. {0}")]
    GatewayUnavailable(GatewayError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<CheckoutDatabaseError> for CheckoutFlowError {
    fn from(e: CheckoutDatabaseError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Payment {0} not found")]
    PaymentNotFound(String),
    #[error("A payment can only be settled as Success or Failed, not {0}")]
    NonTerminalStatus(PaymentStatus),
    #[error("Payment provider unavailable. {0}")]
    GatewayUnavailable(GatewayError),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<CheckoutDatabaseError> for SettlementError {
    fn from(e: CheckoutDatabaseError) -> Self {
        match e {
            CheckoutDatabaseError::NonTerminalSettlement(s) => Self::NonTerminalStatus(s),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<OrderQueryError> for SettlementError {
    fn from(e: OrderQueryError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AdminApiError {
    #[error("Account blocked")]
    PrincipalBlocked,
    #[error("Admin only")]
    NotAdmin,
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Payment {0} not found")]
    PaymentNotFound(String),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    IllegalStateTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} is already {1}")]
    OrderModificationNoOp(OrderId, OrderStatusType),
    #[error("Tracking notes cannot be empty")]
    EmptyNote,
    #[error("Invalid delivery fee: {0}")]
    InvalidDeliveryFee(Pesewas),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<CheckoutDatabaseError> for AdminApiError {
    fn from(e: CheckoutDatabaseError) -> Self {
        match e {
            CheckoutDatabaseError::OrderNotFound(id) => Self::OrderNotFound(id),
            CheckoutDatabaseError::IllegalStateTransition { order_id, from, to } => {
                Self::IllegalStateTransition { order_id, from, to }
            },
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<OrderQueryError> for AdminApiError {
    fn from(e: OrderQueryError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<SettingsError> for AdminApiError {
    fn from(e: SettingsError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrdersApiError {
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderQueryError> for OrdersApiError {
    fn from(e: OrderQueryError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
