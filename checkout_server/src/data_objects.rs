use std::fmt::Display;

use checkout_engine::db_types::{OrderStatusType, Pesewas};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The body of `POST /api/admin/orders/{id}/status`. Statuses are matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

impl StatusUpdateRequest {
    pub fn status(&self) -> Result<OrderStatusType, String> {
        self.status.parse::<OrderStatusType>().map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingNoteRequest {
    pub note: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// The delivery fee, in cedis, as the admin types it in, e.g. `30` or `12.50`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryFeeRequest {
    pub delivery_fee_ghs: serde_json::Number,
}

impl DeliveryFeeRequest {
    pub fn fee(&self) -> Result<Pesewas, String> {
        self.delivery_fee_ghs
            .to_string()
            .parse::<Pesewas>()
            .map_err(|e| format!("{} is not a valid cedi amount. {e}", self.delivery_fee_ghs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFeeResponse {
    /// In pesewas.
    pub delivery_fee: Pesewas,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub status: Option<String>,
}

impl OrdersQuery {
    pub fn status(&self) -> Result<Option<OrderStatusType>, String> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => s.parse::<OrderStatusType>().map(Some).map_err(|e| e.to_string()),
        }
    }
}
