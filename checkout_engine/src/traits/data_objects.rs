use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, Payment, PaymentStatus},
    traits::VerifiedStatus,
};

/// The result of reconciling a payment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// No payment with this reference exists. Nothing was changed.
    UnknownReference,
    /// The payment was already terminal. Nothing was changed.
    AlreadySettled { payment: Payment },
    /// The provider has not reached a verdict yet. Nothing was changed.
    Pending { payment: Payment },
    /// This call performed the terminal write.
    Settled { payment: Payment, order: Order },
}

impl SettlementOutcome {
    pub fn payment(&self) -> Option<&Payment> {
        match self {
            Self::UnknownReference => None,
            Self::AlreadySettled { payment } | Self::Pending { payment } | Self::Settled { payment, .. } => Some(payment),
        }
    }

    /// The local status of the payment after reconciliation, as a client would see it.
    pub fn status(&self) -> Option<VerifiedStatus> {
        self.payment().map(|p| VerifiedStatus::from(p.status))
    }

    pub fn is_settled_as(&self, status: PaymentStatus) -> bool {
        matches!(self, Self::Settled { payment, .. } if payment.status == status)
    }
}

/// The orders touched by a run of the reservation expiry job.
#[derive(Debug, Clone, Default)]
pub struct ExpiryResult {
    /// Orders the provider had actually settled; these got their real verdict.
    pub settled: Vec<Order>,
    /// Orders that were failed because they timed out, with their stock restored.
    pub expired: Vec<Order>,
}

impl ExpiryResult {
    pub fn total_count(&self) -> usize {
        self.settled.len() + self.expired.len()
    }
}
