//! MoMo Checkout Engine
//!
//! The checkout engine turns shopping carts into paid, inventory-accurate orders while the money moves through an
//! external mobile-money gateway that confirms asynchronously and unreliably. This library contains the core logic.
//! It is provider-agnostic.
//!
//! The library is divided into these main sections:
//! 1. The backend contracts ([`mod@traits`]) and the SQLite backend that implements them. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The public API ([`mod@checkout_api`]): reservations, the checkout flow, settlement of payment verdicts, admin
//!    overrides and customer queries.
//!
//! Stock is reserved when the order is created. A payment verdict, whether it arrives by webhook, by a client poll or
//! through the expiry job, is applied exactly once per payment reference; a failed or cancelled order gets its stock
//! back exactly once.
//!
//! The engine also emits events after committed state changes ([`mod@events`]), so that the server can hook in
//! notifications without touching the core flows.
mod checkout_api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    admin_api::{is_allowed_admin_transition, AdminApi, LOW_STOCK_THRESHOLD},
    checkout_flow_api::CheckoutFlowApi,
    errors::{AdminApiError, CheckoutFlowError, OrdersApiError, ReservationError, SettlementError},
    order_objects,
    orders_api::OrdersApi,
    payment_objects,
    reservation_api::ReservationApi,
    settings_api::SettingsApi,
    settlement_api::SettlementApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
