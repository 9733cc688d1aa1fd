//! # Backend and collaborator contracts
//!
//! This module defines the behaviour that database backends and payment providers must expose in order to be used by
//! the checkout engine.
//!
//! * [`CheckoutDatabase`] is the highest level of behaviour for backends. It owns every state change in the system:
//!   stock reservation, payment hand-off, settlement, cancellation and admin status changes. Each of these is a single
//!   atomic operation in the backend.
//! * [`OrderManagement`] provides read-only queries for orders, payments and the catalog.
//! * [`SettingsManagement`] is the read (and admin write) path for store settings, such as the delivery fee.
//! * [`PaymentGateway`] is the contract with the external mobile-money provider.
mod checkout_database;
mod data_objects;
mod order_management;
mod payment_gateway;
mod settings_management;

pub use checkout_database::{CheckoutDatabase, CheckoutDatabaseError};
pub use data_objects::{ExpiryResult, SettlementOutcome};
pub use order_management::{OrderManagement, OrderQueryError};
pub use payment_gateway::{
    ChargeInitiated,
    ChargeMetadata,
    ChargeRequest,
    GatewayError,
    GuidanceType,
    PayerContact,
    PaymentGateway,
    PaymentGuidance,
    VerifiedPayment,
    VerifiedStatus,
    DEFAULT_GUIDANCE_TEXT,
};
pub use settings_management::{SettingsError, SettingsManagement};
