use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::PaystackConfig,
    data_objects::{ChargeData, ChargeResponse, MobileMoneyCharge, PaystackEnvelope, TransactionData, VerifyResponse},
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends the request and returns Paystack's `data` object along with the full response body.
    ///
    /// Non-2xx responses and envelopes with `status: false` are both reported as [`PaystackApiError::QueryError`].
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<(T, Value), PaystackApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
        if !status.is_success() {
            let message = serde_json::from_str::<PaystackEnvelope<Value>>(&text).map(|e| e.message).unwrap_or(text);
            debug!("💳️ Paystack returned {status}. {message}");
            return Err(PaystackApiError::QueryError { status: status.as_u16(), message });
        }
        trace!("💳️ REST query successful. {status}");
        let raw = serde_json::from_str::<Value>(&text).map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
        let envelope = serde_json::from_value::<PaystackEnvelope<T>>(raw.clone())
            .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
        if !envelope.status {
            return Err(PaystackApiError::QueryError { status: status.as_u16(), message: envelope.message });
        }
        let data = envelope.data.ok_or_else(|| PaystackApiError::JsonError("Response has no 'data' field".into()))?;
        Ok((data, raw))
    }

    /// Asks Paystack to push a mobile-money approval prompt to the payer. The charge is not complete when this returns.
    pub async fn charge_mobile_money(&self, charge: &MobileMoneyCharge) -> Result<ChargeResponse, PaystackApiError> {
        debug!("💳️ Charging {} for {} ({})", charge.mobile_money.phone, charge.amount, charge.reference);
        let (data, raw) = self.rest_query::<ChargeData, _>(Method::POST, "/charge", Some(charge)).await?;
        info!("💳️ Charge {} started. Paystack status: {}", charge.reference, data.status);
        let message = raw["message"].as_str().unwrap_or_default().to_string();
        Ok(ChargeResponse { message, data, raw })
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<VerifyResponse, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("💳️ Verifying transaction {reference}");
        let (data, raw) = self.rest_query::<TransactionData, ()>(Method::GET, &path, None).await?;
        debug!("💳️ Transaction {reference} is {}", data.status);
        Ok(VerifyResponse { data, raw })
    }
}
