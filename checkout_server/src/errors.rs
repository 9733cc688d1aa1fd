use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{
    traits::SettingsError,
    AdminApiError,
    CheckoutFlowError,
    OrdersApiError,
    ReservationError,
    SettlementError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientPermissions(String),
    /// The request was understood but asks for something the order state does not allow.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::AccountBlocked => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::SigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Account blocked")]
    AccountBlocked,
    #[error("{0}")]
    InsufficientPermissions(String),
    #[error("Requests from this address are not allowed")]
    ForbiddenPeer,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Could not sign access token. {0}")]
    SigningError(String),
}

impl From<ReservationError> for ServerError {
    fn from(e: ReservationError) -> Self {
        match e {
            ReservationError::PrincipalBlocked => Self::AuthenticationError(AuthError::AccountBlocked),
            ReservationError::InsufficientStock { .. } | ReservationError::StockRaceDetected(_) => {
                Self::Conflict(e.to_string())
            },
            ReservationError::DatabaseError(s) => {
                error!("💻️ Database error during reservation. {s}");
                Self::BackendError(s)
            },
            ReservationError::EmptyCart |
            ReservationError::InvalidQuantity(..) |
            ReservationError::InvalidDeliveryFee(_) |
            ReservationError::MissingPhone |
            ReservationError::InvalidItem(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}

impl From<CheckoutFlowError> for ServerError {
    fn from(e: CheckoutFlowError) -> Self {
        match e {
            CheckoutFlowError::Reservation(e) => e.into(),
            CheckoutFlowError::GatewayUnavailable(_) => Self::ServiceUnavailable(e.to_string()),
            CheckoutFlowError::DatabaseError(s) => {
                error!("💻️ Database error during checkout. {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::NonTerminalStatus(_) => Self::InvalidRequestBody(e.to_string()),
            SettlementError::GatewayUnavailable(_) => Self::ServiceUnavailable(e.to_string()),
            SettlementError::DatabaseError(s) => {
                error!("💻️ Database error during settlement. {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<AdminApiError> for ServerError {
    fn from(e: AdminApiError) -> Self {
        match e {
            AdminApiError::PrincipalBlocked => Self::AuthenticationError(AuthError::AccountBlocked),
            AdminApiError::NotAdmin => Self::AuthenticationError(AuthError::InsufficientPermissions(e.to_string())),
            AdminApiError::OrderNotFound(_) | AdminApiError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            AdminApiError::IllegalStateTransition { .. } => Self::Conflict(e.to_string()),
            AdminApiError::OrderModificationNoOp(..) |
            AdminApiError::EmptyNote |
            AdminApiError::InvalidDeliveryFee(_) => Self::InvalidRequestBody(e.to_string()),
            AdminApiError::DatabaseError(s) => {
                error!("💻️ Database error in admin request. {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<OrdersApiError> for ServerError {
    fn from(e: OrdersApiError) -> Self {
        match e {
            OrdersApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrdersApiError::DatabaseError(s) => {
                error!("💻️ Database error in order query. {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<SettingsError> for ServerError {
    fn from(e: SettingsError) -> Self {
        error!("💻️ Could not read store settings. {e}");
        Self::BackendError(e.to_string())
    }
}
