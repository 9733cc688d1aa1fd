mod pesewas;

pub mod helpers;
pub mod op;
mod secret;

pub use pesewas::{Pesewas, PesewasConversionError, GHS_CURRENCY_CODE, GHS_CURRENCY_SYMBOL};
pub use secret::Secret;
