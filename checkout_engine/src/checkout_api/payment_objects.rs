use serde::{Deserialize, Serialize};
use shop_common::Pesewas;

use crate::{
    db_types::{CartItem, OrderId},
    traits::{PaymentGuidance, VerifiedStatus},
};

/// What the client sends to start a checkout. The delivery fee is not part of the request; the server looks it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    /// The mobile-money number that will be prompted for payment.
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order_id: OrderId,
    pub amount: Pesewas,
    pub reference: String,
    pub guidance: PaymentGuidance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub reference: String,
    pub status: VerifiedStatus,
}
