pub mod notifications;
pub mod paystack;
