//! # Checkout server
//! This crate hosts the HTTP front end of the MoMo checkout engine. It is responsible for:
//! * Taking checkouts from signed-in customers and starting the Paystack mobile-money charge.
//! * Answering the client's payment polls, verifying with Paystack when the payment is still open.
//! * Receiving Paystack webhooks, checking their signatures and settling the payments they refer to.
//! * Admin overrides and back-office queries.
//! * Expiring reservations for orders that were never paid.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/settings/delivery_fee`: The current delivery fee.
//! * `/api/...`: Customer routes. These need a bearer token.
//! * `/api/admin/...`: Admin routes. These need a bearer token with the admin role.
//! * `/paystack/webhook`: Paystack event notifications, authenticated by HMAC signature.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
