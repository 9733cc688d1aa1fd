use std::fmt::Debug;

use log::*;
use shop_common::Pesewas;

use crate::{
    checkout_api::{
        errors::AdminApiError,
        order_objects::{FullOrder, OrderKpis, OrderQueryFilter, PaymentDetail, MAX_LIST_SIZE},
    },
    db_types::{Order, OrderId, OrderStatusType, Payment, Principal, TrackingNote},
    events::{AnnulmentReason, EventProducers, OrderAnnulledEvent, OrderModifiedEvent},
    traits::CheckoutDatabase,
};

/// Active variants with this many units or fewer count as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 3;

/// `AdminApi` holds the manual overrides and the back-office queries. Every call requires an admin principal that has
/// not been blocked.
pub struct AdminApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi")
    }
}

impl<B> AdminApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

/// The only forward moves an admin may make. Cancelling has its own method since it releases stock.
pub fn is_allowed_admin_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
    use OrderStatusType::*;
    matches!((from, to), (Pending, Paid) | (Paid, Fulfilled))
}

fn require_admin(principal: &Principal) -> Result<(), AdminApiError> {
    if principal.blocked {
        warn!("🛡️ Blocked principal {} attempted an admin action", principal.id);
        return Err(AdminApiError::PrincipalBlocked);
    }
    if !principal.is_admin() {
        warn!("🛡️ {} attempted an admin action without the admin role", principal.id);
        return Err(AdminApiError::NotAdmin);
    }
    Ok(())
}

impl<B> AdminApi<B>
where B: CheckoutDatabase
{
    /// Moves an order to `new_status`. Only `Pending → Paid` and `Paid → Fulfilled` are allowed. Stock is not touched.
    pub async fn set_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, AdminApiError> {
        require_admin(principal)?;
        let order = self.db.fetch_order(order_id).await?.ok_or(AdminApiError::OrderNotFound(order_id))?;
        let old_status = order.status;
        if old_status == new_status {
            return Err(AdminApiError::OrderModificationNoOp(order_id, new_status));
        }
        if !is_allowed_admin_transition(old_status, new_status) {
            return Err(AdminApiError::IllegalStateTransition { order_id, from: old_status, to: new_status });
        }
        let updated = self.db.update_order_status(order_id, old_status, new_status).await?;
        info!("🛡️ {} moved order {order_id} from {old_status} to {new_status}", principal.id);
        self.producers.publish_order_modified(OrderModifiedEvent::new(old_status, updated.clone())).await;
        Ok(updated)
    }

    /// Cancels a `Pending` order and returns its reserved stock. Payment records are left as they are.
    pub async fn cancel(&self, principal: &Principal, order_id: OrderId) -> Result<Order, AdminApiError> {
        require_admin(principal)?;
        let order = self.db.cancel_order(order_id).await?;
        info!("🛡️ {} cancelled order {order_id}", principal.id);
        let event = OrderAnnulledEvent::new(order.clone(), AnnulmentReason::Cancelled);
        self.producers.publish_order_annulled(event).await;
        Ok(order)
    }

    /// Appends a note to the order's tracking history and returns the whole history.
    pub async fn add_tracking_note(
        &self,
        principal: &Principal,
        order_id: OrderId,
        note: &str,
        label: Option<&str>,
    ) -> Result<Vec<TrackingNote>, AdminApiError> {
        require_admin(principal)?;
        let note = note.trim();
        if note.is_empty() {
            return Err(AdminApiError::EmptyNote);
        }
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        let notes = self.db.add_tracking_note(order_id, note, label).await?;
        debug!("🛡️ {} added a tracking note to order {order_id}", principal.id);
        Ok(notes)
    }

    pub async fn set_delivery_fee(&self, principal: &Principal, fee: Pesewas) -> Result<Pesewas, AdminApiError> {
        require_admin(principal)?;
        if fee.is_negative() {
            return Err(AdminApiError::InvalidDeliveryFee(fee));
        }
        let fee = self.db.set_delivery_fee(fee).await?;
        info!("🛡️ {} set the delivery fee to {fee}", principal.id);
        Ok(fee)
    }

    pub async fn kpis(&self, principal: &Principal) -> Result<OrderKpis, AdminApiError> {
        require_admin(principal)?;
        let kpis = self.db.fetch_kpis(LOW_STOCK_THRESHOLD).await?;
        Ok(kpis)
    }

    /// The newest orders, optionally only those in the given status.
    pub async fn orders(
        &self,
        principal: &Principal,
        status: Option<OrderStatusType>,
    ) -> Result<Vec<Order>, AdminApiError> {
        require_admin(principal)?;
        let mut query = OrderQueryFilter::default().with_limit(MAX_LIST_SIZE);
        if let Some(status) = status {
            query = query.with_status(status);
        }
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    pub async fn order(&self, principal: &Principal, order_id: OrderId) -> Result<FullOrder, AdminApiError> {
        require_admin(principal)?;
        let order = self.db.fetch_order(order_id).await?.ok_or(AdminApiError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        let tracking_notes = self.db.fetch_tracking_notes(order_id).await?;
        let payment = self.db.fetch_payment_for_order(order_id).await?;
        Ok(FullOrder { order, items, tracking_notes, payment })
    }

    pub async fn payments(&self, principal: &Principal) -> Result<Vec<Payment>, AdminApiError> {
        require_admin(principal)?;
        let payments = self.db.fetch_payments(None, MAX_LIST_SIZE).await?;
        Ok(payments)
    }

    pub async fn payment(&self, principal: &Principal, reference: &str) -> Result<PaymentDetail, AdminApiError> {
        require_admin(principal)?;
        let payment = self
            .db
            .fetch_payment_by_reference(reference)
            .await?
            .ok_or_else(|| AdminApiError::PaymentNotFound(reference.to_string()))?;
        let order = self.db.fetch_order(payment.order_id).await?;
        Ok(PaymentDetail { payment, order })
    }
}
