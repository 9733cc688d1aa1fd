//! # Checkout engine public API
//!
//! The `checkout_api` module exposes the programmatic API for the checkout engine. Each API is created by supplying a
//! backend that implements the traits it needs (and, where a payment provider is involved, a [`PaymentGateway`]):
//!
//! * [`reservation_api`] turns a cart into a pending order with its stock reserved.
//! * [`checkout_flow_api`] runs a whole checkout: reservation, gateway hand-off and payment record.
//! * [`settlement_api`] reconciles payment verdicts from the webhook, client polls and the expiry job.
//! * [`admin_api`] holds the manual overrides and back-office queries.
//! * [`orders_api`] lets customers see their own orders and payments.
//! * [`settings_api`] looks up store settings.
//!
//! ```rust,ignore
//! use checkout_engine::{SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SettlementApi::new(db, gateway, producers);
//! let outcome = api.verify_and_settle("ord_12_1729330000000").await?;
//! ```
//!
//! [`PaymentGateway`]: crate::traits::PaymentGateway

pub mod admin_api;
pub mod checkout_flow_api;
pub mod errors;
pub mod order_objects;
pub mod orders_api;
pub mod payment_objects;
pub mod reservation_api;
pub mod settings_api;
pub mod settlement_api;
