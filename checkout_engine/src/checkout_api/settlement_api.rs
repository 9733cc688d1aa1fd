use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    checkout_api::{errors::SettlementError, payment_objects::PollResult},
    db_types::{Order, OrderStatusType, PaymentStatus, Principal},
    events::{AnnulmentReason, EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    helpers::order_id_from_reference,
    traits::{
        CheckoutDatabase,
        CheckoutDatabaseError,
        ExpiryResult,
        PaymentGateway,
        SettlementOutcome,
        VerifiedStatus,
    },
};

/// `SettlementApi` is the single entry point for applying a payment verdict to an order.
///
/// The webhook, the client poll and the expiry job all end up in [`Self::settle`]. The backend guarantees that the
/// first terminal write for a reference wins, so these callers can race freely.
pub struct SettlementApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for SettlementApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, G> SettlementApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> SettlementApi<B, G>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    /// Applies a verified terminal status to the payment with the given reference.
    ///
    /// This never calls the gateway. Callers must have confirmed `status` with [`PaymentGateway::verify`] first.
    pub async fn settle(
        &self,
        reference: &str,
        status: PaymentStatus,
        raw_payload: Option<String>,
    ) -> Result<SettlementOutcome, SettlementError> {
        if !status.is_terminal() {
            return Err(SettlementError::NonTerminalStatus(status));
        }
        let outcome = self.db.settle_payment(reference, status, raw_payload).await?;
        match &outcome {
            SettlementOutcome::UnknownReference => {
                info!("🧾️ Discarding {status} signal for unknown payment [{reference}]");
            },
            SettlementOutcome::AlreadySettled { payment } => {
                debug!("🧾️ Discarding {status} signal for [{reference}]. It was already settled as {}", payment.status);
            },
            SettlementOutcome::Pending { .. } => {},
            SettlementOutcome::Settled { payment, order } => {
                info!("🧾️ {payment} settled. {order}");
                match (payment.status, order.status) {
                    (PaymentStatus::Success, OrderStatusType::Paid) => {
                        let event = OrderPaidEvent::new(order.clone(), Some(payment.clone()));
                        self.producers.publish_order_paid(event).await;
                    },
                    (PaymentStatus::Failed, OrderStatusType::Failed) => {
                        let event = OrderAnnulledEvent::new(order.clone(), AnnulmentReason::PaymentFailed);
                        self.producers.publish_order_annulled(event).await;
                    },
                    _ => {},
                }
            },
        }
        Ok(outcome)
    }

    /// Asks the gateway for the authoritative status of the payment and settles it if the gateway has a verdict.
    ///
    /// References we have never issued, and payments that are already terminal, are answered from the database
    /// without calling the gateway.
    pub async fn verify_and_settle(&self, reference: &str) -> Result<SettlementOutcome, SettlementError> {
        let Some(payment) = self.db.fetch_payment_by_reference(reference).await? else {
            match order_id_from_reference(reference) {
                Some(order_id) => info!("🧾️ No payment [{reference}] on record (it looks like order {order_id})"),
                None => info!("🧾️ No payment [{reference}] on record"),
            }
            return Ok(SettlementOutcome::UnknownReference);
        };
        if payment.status.is_terminal() {
            trace!("🧾️ Payment [{reference}] is already {}. Not asking the gateway", payment.status);
            return Ok(SettlementOutcome::AlreadySettled { payment });
        }
        let verified = self.gateway.verify(reference).await.map_err(|e| {
            warn!("💳️ Could not verify payment [{reference}]. {e}");
            SettlementError::GatewayUnavailable(e)
        })?;
        debug!("💳️ Gateway says payment [{reference}] is {}", verified.status);
        match verified.status.as_terminal() {
            Some(status) => self.settle(reference, status, verified.raw).await,
            None => Ok(SettlementOutcome::Pending { payment }),
        }
    }

    /// The client-facing poll. Safe to call any number of times.
    ///
    /// Only the payer or an admin may poll a payment. Anyone else is told it does not exist.
    pub async fn poll(&self, principal: &Principal, reference: &str) -> Result<PollResult, SettlementError> {
        let payment = self
            .db
            .fetch_payment_by_reference(reference)
            .await?
            .filter(|p| p.customer_id == principal.id || principal.is_admin())
            .ok_or_else(|| SettlementError::PaymentNotFound(reference.to_string()))?;
        let status = if payment.status.is_terminal() {
            VerifiedStatus::from(payment.status)
        } else {
            self.verify_and_settle(reference).await?.status().unwrap_or(VerifiedStatus::Pending)
        };
        Ok(PollResult { reference: reference.to_string(), status })
    }

    /// Releases reservations for orders that have been `Pending` for longer than `timeout`.
    ///
    /// Orders with a payment attempt get one last check with the gateway, and a real verdict is applied as is.
    /// Otherwise the order is cancelled and its stock released, but the payment stays `Initiated`. Only the gateway
    /// decides how a payment ends, so a payer who approves the charge afterwards is still recorded as having paid (and
    /// flagged for a refund). A failure on one order is logged and does not stop the others from being processed.
    pub async fn expire_stale_reservations(&self, timeout: Duration) -> Result<ExpiryResult, SettlementError> {
        let stale = self.db.fetch_stale_pending_orders(timeout).await?;
        let mut result = ExpiryResult::default();
        if stale.is_empty() {
            return Ok(result);
        }
        debug!("🕰️ {} pending orders are older than {} minutes", stale.len(), timeout.num_minutes());
        for order in stale {
            let payment = match self.db.fetch_payment_for_order(order.id).await {
                Ok(p) => p,
                Err(e) => {
                    error!("🕰️ Could not fetch the payment for order {}. {e}", order.id);
                    continue;
                },
            };
            match payment {
                Some(payment) if !payment.status.is_terminal() => {
                    let reference = payment.reference.as_str();
                    let verdict = match self.gateway.verify(reference).await {
                        Ok(v) => v.status.as_terminal().map(|s| (s, v.raw)),
                        Err(e) => {
                            warn!("🕰️ Could not verify [{reference}] before expiring order {}. {e}", order.id);
                            None
                        },
                    };
                    match verdict {
                        Some((status, raw)) => match self.settle(reference, status, raw).await {
                            Ok(SettlementOutcome::Settled { order, .. }) => result.settled.push(order),
                            Ok(_) => trace!("🕰️ Payment [{reference}] was settled by someone else in the meantime"),
                            Err(e) => error!("🕰️ Could not settle [{reference}] for order {}. {e}", order.id),
                        },
                        None => {
                            debug!("🕰️ Payment [{reference}] is still open. Expiring order {}", order.id);
                            self.expire_order(&order, &mut result).await;
                        },
                    }
                },
                Some(payment) => {
                    warn!(
                        "🕰️ Order {} is still pending but its payment [{}] is {}. Leaving it for an admin to resolve.",
                        order.id, payment.reference, payment.status
                    );
                },
                None => self.expire_order(&order, &mut result).await,
            }
        }
        info!(
            "🕰️ Expiry run complete. {} orders were settled by the gateway and {} expired",
            result.settled.len(),
            result.expired.len()
        );
        Ok(result)
    }

    async fn expire_order(&self, order: &Order, result: &mut ExpiryResult) {
        match self.db.cancel_order(order.id).await {
            Ok(order) => {
                let event = OrderAnnulledEvent::new(order.clone(), AnnulmentReason::Expired);
                self.producers.publish_order_annulled(event).await;
                result.expired.push(order);
            },
            Err(CheckoutDatabaseError::IllegalStateTransition { from, .. }) => {
                trace!("🕰️ Order {} moved to {from} before it could be expired", order.id);
            },
            Err(e) => error!("🕰️ Could not expire order {}. {e}", order.id),
        }
    }
}
