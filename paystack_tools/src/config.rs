use std::time::Duration;

use log::*;
use shop_common::Secret;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_MOMO_PROVIDER: &str = "MTN";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// The mobile-money network code sent with every charge, e.g. `MTN`, `VOD` or `ATL`.
    pub momo_provider: String,
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            secret_key: Secret::default(),
            momo_provider: DEFAULT_MOMO_PROVIDER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("CHECKOUT_PAYSTACK_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_PAYSTACK_BASE_URL.to_string());
        let secret_key = Secret::new(std::env::var("CHECKOUT_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CHECKOUT_PAYSTACK_SECRET_KEY not set. Every call to Paystack will be rejected.");
            String::default()
        }));
        let momo_provider = std::env::var("CHECKOUT_PAYSTACK_MOMO_PROVIDER").unwrap_or_else(|_| {
            info!("🪛️ CHECKOUT_PAYSTACK_MOMO_PROVIDER not set, using {DEFAULT_MOMO_PROVIDER} as default");
            DEFAULT_MOMO_PROVIDER.to_string()
        });
        let timeout = std::env::var("CHECKOUT_PAYSTACK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid CHECKOUT_PAYSTACK_TIMEOUT_SECS ({s}): {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { base_url, secret_key, momo_provider, timeout }
    }
}
