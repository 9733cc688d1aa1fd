//! A thin client for the parts of the Paystack REST API that a mobile-money checkout needs: starting a charge and
//! verifying a transaction. It knows nothing about orders or stock.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    synthetic_email,
    ChargeData,
    ChargeMetadata,
    ChargeResponse,
    MobileMoney,
    MobileMoneyCharge,
    PaystackEnvelope,
    TransactionData,
    TransactionVerdict,
    VerifyResponse,
    WebhookEvent,
};
pub use error::PaystackApiError;
