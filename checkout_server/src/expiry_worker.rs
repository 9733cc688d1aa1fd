use chrono::Duration;
use checkout_engine::{db_types::Order, events::EventProducers, SettlementApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::paystack::PaystackGateway;

pub const EXPIRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the reservation expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, orders that have been pending for longer than `unpaid_expiry` get one last check with Paystack. The
/// ones that are still not paid are failed and their stock goes back on the shelf.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
    unpaid_expiry: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_INTERVAL);
        let api = SettlementApi::new(db, gateway, producers);
        info!("🕰️ Unpaid order expiry worker started. Orders expire after {} minutes", unpaid_expiry.num_minutes());
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid order expiry job");
            match api.expire_stale_reservations(unpaid_expiry).await {
                Ok(result) if result.total_count() == 0 => trace!("🕰️ No stale reservations"),
                Ok(result) => {
                    info!("🕰️ {} stale orders processed", result.total_count());
                    debug!("🕰️ {} settled by the provider: {}", result.settled.len(), order_list(&result.settled));
                    debug!("🕰️ {} expired: {}", result.expired.len(), order_list(&result.expired));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders.iter().map(|o| format!("{} cust_id: {} ({})", o.id, o.customer_id, o.status)).collect::<Vec<_>>().join(", ")
}
