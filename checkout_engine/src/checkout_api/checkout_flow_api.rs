use std::fmt::Debug;

use chrono::Utc;
use log::*;
use shop_common::Pesewas;

use crate::{
    checkout_api::{
        errors::CheckoutFlowError,
        payment_objects::{CheckoutRequest, CheckoutResult},
        reservation_api::ReservationApi,
    },
    db_types::{NewPayment, Order, Principal},
    events::{AnnulmentReason, EventProducers, OrderAnnulledEvent},
    helpers::payment_reference,
    traits::{ChargeMetadata, ChargeRequest, CheckoutDatabase, PayerContact, PaymentGateway},
};

/// `CheckoutFlowApi` runs a checkout end to end: reserve, hand off to the gateway, and record the payment attempt.
///
/// If the hand-off fails, the reservation is rolled back through the same compensation path used for failed payments,
/// so no order is ever left `Pending` without a payment attempt behind it.
pub struct CheckoutFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for CheckoutFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutFlowApi")
    }
}

impl<B, G> CheckoutFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> CheckoutFlowApi<B, G>
where
    B: CheckoutDatabase,
    G: PaymentGateway,
{
    /// Checks out the cart for `principal`. The delivery fee must come from the store settings, never from the client.
    pub async fn checkout(
        &self,
        principal: &Principal,
        request: CheckoutRequest,
        delivery_fee: Pesewas,
    ) -> Result<CheckoutResult, CheckoutFlowError> {
        let reservations = ReservationApi::new(self.db.clone());
        let order = reservations.reserve(principal, &request.items, delivery_fee, &request.phone).await?;
        let reference = payment_reference(order.id, Utc::now());
        let charge = ChargeRequest {
            amount: order.total,
            reference: reference.clone(),
            contact: PayerContact { phone: order.customer_phone.clone(), email: request.email.clone() },
            metadata: ChargeMetadata { order_id: order.id, customer_id: order.customer_id.clone() },
        };
        let initiated = match self.gateway.initiate(charge).await {
            Ok(initiated) => initiated,
            Err(e) => {
                warn!("💳️ Could not start the charge for order {}. Releasing the reservation. {e}", order.id);
                self.roll_back(&order).await;
                return Err(CheckoutFlowError::GatewayUnavailable(e));
            },
        };
        // Settlement is keyed on whatever reference the provider will report back in webhooks and verify calls
        let reference = match initiated.provider_reference.trim() {
            "" => reference,
            assigned if assigned != reference => {
                debug!("💳️ Charge [{reference}] was assigned the provider reference [{assigned}]");
                assigned.to_string()
            },
            _ => reference,
        };
        debug!("💳️ Charge [{reference}] started with {} for order {}", self.gateway.provider_name(), order.id);
        let payment = NewPayment {
            order_id: order.id,
            customer_id: order.customer_id.clone(),
            provider: self.gateway.provider_name(),
            reference: reference.clone(),
            amount: order.total,
            raw_payload: initiated.raw,
        };
        if let Err(e) = self.db.insert_payment_for_order(payment).await {
            error!(
                "💳️ The charge [{reference}] was started but could not be recorded. The order {} will be cancelled. If \
                 the payer approves the prompt, the payment will need a manual refund. {e}",
                order.id
            );
            self.roll_back(&order).await;
            return Err(e.into());
        }
        info!("🛒️ Checkout complete for order {} ({}). Waiting on payment [{reference}]", order.id, order.total);
        Ok(CheckoutResult { order_id: order.id, amount: order.total, reference, guidance: initiated.guidance })
    }

    async fn roll_back(&self, order: &Order) {
        match self.db.cancel_order(order.id).await {
            Ok(order) => {
                let event = OrderAnnulledEvent::new(order, AnnulmentReason::GatewayUnavailable);
                self.producers.publish_order_annulled(event).await;
            },
            Err(e) => {
                error!(
                    "🛒️ Could not roll back the reservation for order {}. The expiry job will retry it. {e}",
                    order.id
                );
            },
        }
    }
}
