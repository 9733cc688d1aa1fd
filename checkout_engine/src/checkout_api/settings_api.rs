use log::*;
use shop_common::Pesewas;

use crate::traits::{SettingsError, SettingsManagement};

/// Read access to store settings, with a configured fallback for values the store has never set.
pub struct SettingsApi<B> {
    db: B,
    default_delivery_fee: Pesewas,
}

impl<B> SettingsApi<B> {
    pub fn new(db: B, default_delivery_fee: Pesewas) -> Self {
        Self { db, default_delivery_fee }
    }
}

impl<B> SettingsApi<B>
where B: SettingsManagement
{
    /// The delivery fee charged on every order. This is the authoritative value at checkout.
    pub async fn delivery_fee(&self) -> Result<Pesewas, SettingsError> {
        let fee = self.db.fetch_delivery_fee().await?;
        Ok(fee.unwrap_or_else(|| {
            trace!("🪛️ No delivery fee has been set. Using the default of {}", self.default_delivery_fee);
            self.default_delivery_fee
        }))
    }
}
