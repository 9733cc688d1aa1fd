use std::{env, net::IpAddr};

use chrono::Duration;
use log::*;
use paystack_tools::PaystackConfig;
use shop_common::{helpers::parse_boolean_flag, Pesewas, Secret};

const DEFAULT_CHECKOUT_HOST: &str = "127.0.0.1";
const DEFAULT_CHECKOUT_PORT: u16 = 8380;
const DEFAULT_DELIVERY_FEE_CEDIS: i64 = 30;
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::minutes(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub webhook: WebhookConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The delivery fee charged when the store settings have never been saved.
    pub default_delivery_fee: Pesewas,
    /// The time before a pending order releases its stock and is marked as failed.
    pub unpaid_order_timeout: Duration,
    /// Apply outstanding database migrations on start-up.
    pub run_migrations: bool,
    pub paystack: PaystackConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHECKOUT_HOST.to_string(),
            port: DEFAULT_CHECKOUT_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            default_delivery_fee: Pesewas::from_cedis(DEFAULT_DELIVERY_FEE_CEDIS),
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            run_migrations: true,
            paystack: PaystackConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHECKOUT_HOST").ok().unwrap_or_else(|| DEFAULT_CHECKOUT_HOST.into());
        let port = env::var("CHECKOUT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHECKOUT_PORT. {e} Using the default, {DEFAULT_CHECKOUT_PORT}, \
                         instead."
                    );
                    DEFAULT_CHECKOUT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHECKOUT_PORT);
        let database_url = env::var("CHECKOUT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CHECKOUT_DATABASE_URL is not set. Please set it to the URL for the checkout database.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(env::var("CHECKOUT_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CHECKOUT_USE_FORWARDED").ok(), false);
        let run_migrations = parse_boolean_flag(env::var("CHECKOUT_RUN_MIGRATIONS").ok(), true);
        let default_delivery_fee = configure_default_delivery_fee();
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        Self {
            host,
            port,
            database_url,
            auth,
            webhook,
            use_x_forwarded_for,
            use_forwarded,
            default_delivery_fee,
            unpaid_order_timeout,
            run_migrations,
            paystack: PaystackConfig::new_from_env_or_default(),
        }
    }
}

fn configure_default_delivery_fee() -> Pesewas {
    let default = Pesewas::from_cedis(DEFAULT_DELIVERY_FEE_CEDIS);
    env::var("CHECKOUT_DEFAULT_DELIVERY_FEE")
        .map_err(|_| info!("🪛️ CHECKOUT_DEFAULT_DELIVERY_FEE is not set. Using the default value of {default}."))
        .and_then(|s| {
            s.parse::<Pesewas>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for CHECKOUT_DEFAULT_DELIVERY_FEE. {e}"))
        })
        .and_then(|fee| {
            if fee.is_negative() {
                warn!("🪛️ CHECKOUT_DEFAULT_DELIVERY_FEE cannot be negative. Using the default value of {default}.");
                Err(())
            } else {
                Ok(fee)
            }
        })
        .unwrap_or(default)
}

fn configure_unpaid_order_timeout() -> Duration {
    match env::var("CHECKOUT_UNPAID_ORDER_TIMEOUT") {
        Ok(s) => parse_unpaid_order_timeout(&s).unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT),
        Err(_) => {
            info!(
                "🪛️ CHECKOUT_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} minutes.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_minutes()
            );
            DEFAULT_UNPAID_ORDER_TIMEOUT
        },
    }
}

fn parse_unpaid_order_timeout(value: &str) -> Option<Duration> {
    let minutes = value
        .trim()
        .parse::<i64>()
        .map_err(|e| warn!("🪛️ Invalid configuration value for CHECKOUT_UNPAID_ORDER_TIMEOUT. {e}"))
        .ok()?;
    if minutes <= 0 {
        warn!("🪛️ CHECKOUT_UNPAID_ORDER_TIMEOUT must be a positive number of minutes.");
        return None;
    }
    let timeout = Duration::try_minutes(minutes);
    if timeout.is_none() {
        warn!("🪛️ CHECKOUT_UNPAID_ORDER_TIMEOUT of {minutes} minutes is too large.");
    }
    timeout
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// The shared HS256 secret used to validate access tokens issued by the identity provider.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(jwt_secret: S) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.into()) }
    }

    pub fn from_env_or_default() -> Self {
        match env::var("CHECKOUT_JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => Self::new(s),
            _ => {
                warn!(
                    "🚨️🚨️🚨️ CHECKOUT_JWT_SECRET is not set. Every authenticated request will be rejected until it \
                     is. 🚨️🚨️🚨️"
                );
                Self::default()
            },
        }
    }
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    /// The key Paystack signs webhook bodies with. Paystack uses the account's secret key for this.
    pub secret: Secret<String>,
    /// If supplied, requests against /paystack endpoints will be checked against a whitelist of IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub ip_whitelist: Option<Vec<IpAddr>>,
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("CHECKOUT_PAYSTACK_WEBHOOK_SECRET")
            .or_else(|_| {
                debug!("🪛️ CHECKOUT_PAYSTACK_WEBHOOK_SECRET is not set. Falling back to CHECKOUT_PAYSTACK_SECRET_KEY.");
                env::var("CHECKOUT_PAYSTACK_SECRET_KEY")
            })
            .unwrap_or_else(|_| {
                error!(
                    "🪛️ Neither CHECKOUT_PAYSTACK_WEBHOOK_SECRET nor CHECKOUT_PAYSTACK_SECRET_KEY is set. Every \
                     webhook call will be rejected."
                );
                String::default()
            });
        let ip_whitelist = env::var("CHECKOUT_PAYSTACK_IP_WHITELIST").ok().and_then(|s| parse_ip_whitelist(&s));
        match &ip_whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Paystack IP whitelist was configured, but is empty. The server will run, but won't \
                     authorise any incoming webhook calls."
                );
            },
            None => {
                info!("🪛️ No Paystack IP whitelist is set. Only HMAC validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Paystack IP whitelist: {addrs}");
            },
        }
        Self { secret: Secret::new(secret), ip_whitelist }
    }
}

fn parse_ip_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Paystack IP whitelist is disabled. If this is not what you want, set CHECKOUT_PAYSTACK_IP_WHITELIST to \
             a comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in CHECKOUT_PAYSTACK_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect();
    Some(ip_addrs)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
