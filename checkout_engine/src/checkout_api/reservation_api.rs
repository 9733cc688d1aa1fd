use std::fmt::Debug;

use log::*;
use shop_common::Pesewas;

use crate::{
    checkout_api::errors::ReservationError,
    db_types::{merge_cart_lines, CartItem, NewOrder, NewOrderItem, Order, Principal},
    traits::{CheckoutDatabase, CheckoutDatabaseError},
};

/// `ReservationApi` turns a cart into a pending order, taking the stock for every line up front.
pub struct ReservationApi<B> {
    db: B,
}

impl<B> Debug for ReservationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReservationApi")
    }
}

impl<B> ReservationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReservationApi<B>
where B: CheckoutDatabase
{
    /// Validates the cart against the current catalog, reserves the stock and creates a `Pending` order.
    ///
    /// Prices are always taken from the catalog. Repeated lines for the same variant are merged before any checks are
    /// made. The stock check here is advisory and gives the shopper a helpful message; the authoritative check is the
    /// conditional decrement inside [`CheckoutDatabase::reserve_stock_and_insert_order`], which fails the whole
    /// reservation with [`ReservationError::StockRaceDetected`] if stock moved in the meantime.
    pub async fn reserve(
        &self,
        principal: &Principal,
        items: &[CartItem],
        delivery_fee: Pesewas,
        customer_phone: &str,
    ) -> Result<Order, ReservationError> {
        if principal.blocked {
            warn!("🛒️ Blocked user {} attempted to check out", principal.id);
            return Err(ReservationError::PrincipalBlocked);
        }
        if items.is_empty() {
            return Err(ReservationError::EmptyCart);
        }
        if let Some(bad) = items.iter().find(|i| i.quantity <= 0) {
            return Err(ReservationError::InvalidQuantity(bad.variant_id, bad.quantity));
        }
        if delivery_fee.is_negative() {
            return Err(ReservationError::InvalidDeliveryFee(delivery_fee));
        }
        let phone = customer_phone.trim();
        if phone.is_empty() {
            return Err(ReservationError::MissingPhone);
        }
        // Only fails when merged quantities overflow
        let lines = merge_cart_lines(items).ok_or(ReservationError::InvalidQuantity(items[0].variant_id, i64::MAX))?;

        let mut order = NewOrder::new(principal.id.as_str(), phone, delivery_fee);
        for line in lines {
            let item = self
                .db
                .fetch_catalog_item(line.variant_id)
                .await?
                .filter(|item| item.is_purchasable())
                .ok_or(ReservationError::InvalidItem(line.variant_id))?;
            if item.stock < line.quantity {
                debug!(
                    "🛒️ {} asked for {} of {} but only {} are left",
                    principal.id,
                    line.quantity,
                    item.display_name(),
                    item.stock
                );
                return Err(ReservationError::InsufficientStock {
                    item: item.display_name(),
                    requested: line.quantity,
                    available: item.stock,
                });
            }
            order = order.with_item(NewOrderItem::from_catalog(&item, line.quantity));
        }
        let order = self.db.reserve_stock_and_insert_order(order).await.map_err(|e| {
            match &e {
                CheckoutDatabaseError::StockRaceDetected(v) => {
                    info!("🛒️ Stock for {v} changed while {} was checking out", principal.id)
                },
                e => error!("🛒️ Could not reserve stock for {}. {e}", principal.id),
            }
            ReservationError::from(e)
        })?;
        info!("🛒️ {order} reserved");
        Ok(order)
    }
}
