//! The contract with the external mobile-money provider.
//!
//! The engine never assumes a provider's wire format. A provider binding implements [`PaymentGateway`] and translates
//! between these types and its own API.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shop_common::Pesewas;
use thiserror::Error;

use crate::db_types::{OrderId, PaymentStatus};

pub const DEFAULT_GUIDANCE_TEXT: &str = "Approve the MoMo prompt on your phone. We'll confirm automatically.";

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// The name stored against every payment made through this gateway, e.g. "paystack".
    fn provider_name(&self) -> String;

    /// Asks the provider to prompt the payer. This returns as soon as the provider has accepted the request; the
    /// verdict arrives later, via webhook or [`Self::verify`].
    async fn initiate(&self, request: ChargeRequest) -> Result<ChargeInitiated, GatewayError>;

    /// Queries the provider's authoritative status for the given reference.
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerContact {
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeMetadata {
    pub order_id: OrderId,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub amount: Pesewas,
    pub reference: String,
    pub contact: PayerContact,
    pub metadata: ChargeMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceType {
    /// The payer approves on their handset; the client should poll for the result.
    Poll,
    /// The payer must complete the payment on the provider's page.
    Redirect,
    /// The payer must dial a USSD code.
    Ussd,
}

/// Tells the client how the payer completes the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentGuidance {
    #[serde(rename = "type")]
    pub kind: GuidanceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    pub display_text: String,
}

impl Default for PaymentGuidance {
    fn default() -> Self {
        Self { kind: GuidanceType::Poll, authorization_url: None, display_text: DEFAULT_GUIDANCE_TEXT.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeInitiated {
    pub provider_reference: String,
    pub guidance: PaymentGuidance,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifiedStatus {
    Success,
    Failed,
    Pending,
}

impl VerifiedStatus {
    /// The payment status to settle with, or `None` if the provider has no verdict yet.
    pub fn as_terminal(&self) -> Option<PaymentStatus> {
        match self {
            Self::Success => Some(PaymentStatus::Success),
            Self::Failed => Some(PaymentStatus::Failed),
            Self::Pending => None,
        }
    }
}

impl From<PaymentStatus> for VerifiedStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Initiated => Self::Pending,
            PaymentStatus::Success => Self::Success,
            PaymentStatus::Failed => Self::Failed,
        }
    }
}

impl Display for VerifiedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    pub reference: String,
    pub status: VerifiedStatus,
    pub raw: Option<String>,
}

impl VerifiedPayment {
    pub fn new<S: Into<String>>(reference: S, status: VerifiedStatus) -> Self {
        Self { reference: reference.into(), status, raw: None }
    }

    pub fn with_raw<S: Into<String>>(mut self, raw: S) -> Self {
        self.raw = Some(raw.into());
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment provider could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment provider rejected the request. {0}")]
    Rejected(String),
    #[error("The payment provider sent a response we could not understand. {0}")]
    InvalidResponse(String),
}
