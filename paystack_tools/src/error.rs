use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach Paystack: {0}")]
    Transport(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl PaystackApiError {
    /// Network failures and 5xx responses. The request may well succeed if it is retried later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Paystack's answer for references it has never seen. Auth failures are ours to fix, so they are not included.
    pub fn is_unknown_reference(&self) -> bool {
        matches!(self, Self::QueryError { status: 400 | 404, .. })
    }
}
