use shop_common::Pesewas;
use thiserror::Error;

#[allow(async_fn_in_trait)]
pub trait SettingsManagement {
    /// The configured delivery fee, or `None` if the store has not set one yet.
    async fn fetch_delivery_fee(&self) -> Result<Option<Pesewas>, SettingsError>;

    async fn set_delivery_fee(&self, fee: Pesewas) -> Result<Pesewas, SettingsError>;
}

#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

impl From<sqlx::Error> for SettingsError {
    fn from(e: sqlx::Error) -> Self {
        SettingsError::DatabaseError(e.to_string())
    }
}
