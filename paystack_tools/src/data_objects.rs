use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::{Pesewas, GHS_CURRENCY_CODE};

/// Every Paystack response is wrapped in this envelope. `status` is Paystack's own success flag, not the HTTP status.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaystackEnvelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileMoney {
    pub phone: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeMetadata {
    pub order_id: i64,
    pub customer_id: String,
}

/// The body of `POST /charge` for a mobile-money payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileMoneyCharge {
    pub email: String,
    pub amount: Pesewas,
    pub currency: String,
    pub reference: String,
    pub mobile_money: MobileMoney,
    pub metadata: ChargeMetadata,
}

impl MobileMoneyCharge {
    pub fn new(email: String, amount: Pesewas, reference: String, mobile_money: MobileMoney, metadata: ChargeMetadata) -> Self {
        Self { email, amount, currency: GHS_CURRENCY_CODE.to_string(), reference, mobile_money, metadata }
    }
}

/// Paystack insists on an email address for every charge. Mobile-money payers often do not have one.
pub fn synthetic_email(customer_id: &str) -> String {
    let local = customer_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || "._-+".contains(c) { c } else { '_' })
        .collect::<String>();
    format!("{local}@phone.local")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub reference: Option<String>,
    /// `send_otp`, `pay_offline`, `pending`, `success`, `failed` and so on.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub ussd_code: Option<String>,
}

impl ChargeData {
    /// A page the payer has to visit to approve the charge, if Paystack handed one back.
    pub fn redirect_url(&self) -> Option<&str> {
        self.url.as_deref().or(self.authorization_url.as_deref()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ChargeResponse {
    pub message: String,
    pub data: ChargeData,
    pub raw: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub id: Option<i64>,
    pub reference: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<Pesewas>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VerifyResponse {
    pub data: TransactionData,
    pub raw: Value,
}

impl VerifyResponse {
    pub fn verdict(&self) -> TransactionVerdict {
        TransactionVerdict::from_status(&self.data.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionVerdict {
    Success,
    Failed,
    Pending,
}

impl TransactionVerdict {
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" | "abandoned" | "reversed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// The body Paystack posts to the webhook. Only the reference is trusted; the status it carries is re-checked with
/// [`crate::PaystackApi::verify_transaction`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    pub fn reference(&self) -> Option<&str> {
        self.data.get("reference").and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }
}
