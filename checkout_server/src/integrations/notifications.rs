//! Order lifecycle notifications.
//!
//! The checkout engine publishes an event after every committed order transition. These hooks are where customer and
//! staff notifications plug in. For now they write an audit trail to the log under the `checkout::notifications`
//! target, so that a log shipper can forward them.
//!
//! Hooks run on their own tasks, so a slow notifier never holds up a checkout or a webhook.
use checkout_engine::events::{
    EventHandlers,
    EventHooks,
    HookFuture,
    OrderAnnulledEvent,
    OrderModifiedEvent,
    OrderPaidEvent,
};
use log::*;

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;
const TARGET: &str = "checkout::notifications";

pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    // --- On OrderPaid Handler ---
    hooks.on_order_paid(|ev| {
        let OrderPaidEvent { order, payment } = ev;
        let reference = payment.map(|p| p.reference).unwrap_or_else(|| "(admin override)".to_string());
        Box::pin(async move {
            info!(
                target: TARGET,
                "📬️ {} has been paid. Customer {} will be told their order is confirmed. Reference: {reference}",
                order.id,
                order.customer_id
            );
        })
    });
    // --- On OrderAnnulled Handler ---
    hooks.on_order_annulled(|ev| {
        let OrderAnnulledEvent { order, reason } = ev;
        if order.customer_phone.is_empty() {
            return no_op();
        }
        Box::pin(async move {
            info!(
                target: TARGET,
                "📬️ {} did not go through ({reason:?}). Customer {} at {} will be told to try again.",
                order.id,
                order.customer_id,
                order.customer_phone
            );
        })
    });
    // --- On OrderModified Handler ---
    hooks.on_order_modified(|ev| {
        let OrderModifiedEvent { old_status, new_order } = ev;
        Box::pin(async move {
            info!(
                target: TARGET,
                "📬️ {} moved from {old_status} to {}. Customer {} will be notified.",
                new_order.id,
                new_order.status,
                new_order.customer_id
            );
        })
    });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> HookFuture {
    Box::pin(async {})
}
