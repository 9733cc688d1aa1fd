//! Binds the checkout engine's [`PaymentGateway`] contract to Paystack mobile money.
use checkout_engine::traits::{
    ChargeInitiated,
    ChargeRequest,
    GatewayError,
    GuidanceType,
    PaymentGateway,
    PaymentGuidance,
    VerifiedPayment,
    VerifiedStatus,
    DEFAULT_GUIDANCE_TEXT,
};
use log::*;
use paystack_tools::{
    synthetic_email,
    ChargeData,
    ChargeMetadata,
    MobileMoney,
    MobileMoneyCharge,
    PaystackApi,
    PaystackApiError,
    PaystackConfig,
    TransactionVerdict,
};
use serde_json::json;

pub const PAYSTACK_PROVIDER_NAME: &str = "paystack";

#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        if config.secret_key.is_empty() {
            warn!("💳️ No Paystack secret key is configured. Every charge will be rejected.");
        }
        let api = PaystackApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for PaystackGateway {
    fn provider_name(&self) -> String {
        PAYSTACK_PROVIDER_NAME.to_string()
    }

    async fn initiate(&self, request: ChargeRequest) -> Result<ChargeInitiated, GatewayError> {
        let ChargeRequest { amount, reference, contact, metadata } = request;
        let email = contact
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| synthetic_email(&metadata.customer_id));
        let mobile_money = MobileMoney { phone: contact.phone, provider: self.api.config().momo_provider.clone() };
        let metadata = ChargeMetadata { order_id: metadata.order_id.value(), customer_id: metadata.customer_id };
        let charge = MobileMoneyCharge::new(email, amount, reference.clone(), mobile_money, metadata);
        let response = self.api.charge_mobile_money(&charge).await.map_err(|e| {
            warn!("💳️ Paystack did not accept the charge for [{reference}]. {e}");
            gateway_error(e)
        })?;
        let guidance = guidance_for(&response.data);
        debug!("💳️ Payer guidance for [{reference}]: {:?}", guidance.kind);
        let provider_reference = response.data.reference.clone().filter(|r| !r.is_empty()).unwrap_or(reference);
        Ok(ChargeInitiated { provider_reference, guidance, raw: Some(response.raw.to_string()) })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        match self.api.verify_transaction(reference).await {
            Ok(response) => {
                let status = match response.verdict() {
                    TransactionVerdict::Success => VerifiedStatus::Success,
                    TransactionVerdict::Failed => VerifiedStatus::Failed,
                    TransactionVerdict::Pending => VerifiedStatus::Pending,
                };
                Ok(VerifiedPayment::new(reference, status).with_raw(response.raw.to_string()))
            },
            Err(e) if e.is_unknown_reference() => {
                info!("💳️ Paystack does not know [{reference}]. Treating it as failed. {e}");
                let raw = json!({ "error": e.to_string() }).to_string();
                Ok(VerifiedPayment::new(reference, VerifiedStatus::Failed).with_raw(raw))
            },
            Err(e) => {
                warn!("💳️ Could not verify [{reference}] with Paystack. {e}");
                Err(gateway_error(e))
            },
        }
    }
}

fn gateway_error(e: PaystackApiError) -> GatewayError {
    if e.is_transient() {
        GatewayError::Unavailable(e.to_string())
    } else if matches!(e, PaystackApiError::JsonError(_)) {
        GatewayError::InvalidResponse(e.to_string())
    } else {
        GatewayError::Rejected(e.to_string())
    }
}

/// Works out how the payer completes the charge from what Paystack sent back.
pub fn guidance_for(data: &ChargeData) -> PaymentGuidance {
    let display_text = data.display_text.clone().filter(|s| !s.trim().is_empty());
    if let Some(url) = data.redirect_url() {
        return PaymentGuidance {
            kind: GuidanceType::Redirect,
            authorization_url: Some(url.to_string()),
            display_text: display_text.unwrap_or_else(|| "Complete the payment on the Paystack page.".to_string()),
        };
    }
    if let Some(code) = data.ussd_code.as_deref().filter(|c| !c.trim().is_empty()) {
        return PaymentGuidance {
            kind: GuidanceType::Ussd,
            authorization_url: None,
            display_text: display_text.unwrap_or_else(|| format!("Dial {code} to approve the payment.")),
        };
    }
    PaymentGuidance {
        kind: GuidanceType::Poll,
        authorization_url: None,
        display_text: display_text.unwrap_or_else(|| DEFAULT_GUIDANCE_TEXT.to_string()),
    }
}
