use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use cdp_engine::{
    traits::{AuthProviderError, ProviderError},
    CheckoutError,
};
use serde_json::{json, Value};
use thiserror::Error;

fn json_response(status: StatusCode, body: Value) -> HttpResponse {
    HttpResponse::build(status).insert_header(ContentType::json()).body(body.to_string())
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Missing required parameters")]
    MissingParameters,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Failed to create Razorpay order")]
    ProviderError(#[from] ProviderError),
    #[error("{0}")]
    ProfileUpdateFailed(String),
    #[error("Access denied for this peer")]
    ForbiddenPeer,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// The text that is safe to show to the caller. Internal failures are reported generically.
    pub fn public_message(&self) -> String {
        match self {
            Self::InitializeError(_) |
            Self::BackendError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::MissingParameters => StatusCode::BAD_REQUEST,
            Self::ProfileUpdateFailed(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ForbiddenPeer => StatusCode::FORBIDDEN,
            Self::ProviderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_response(self.status_code(), json!({ "error": self.public_message() }))
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::MissingParameters => Self::MissingParameters,
            CheckoutError::ProviderError(e) => Self::ProviderError(e),
        }
    }
}

impl From<AuthProviderError> for ServerError {
    fn from(e: AuthProviderError) -> Self {
        Self::BackendError(format!("Auth provider error: {e}"))
    }
}

//-------------------------------------------------  Verification  -----------------------------------------------------
/// Failures of the checkout callback. Every body carries `"success": false`.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Invalid payment signature")]
    InvalidSignature,
    #[error("Unauthorized - User session does not match target user")]
    SessionMismatch,
    #[error("Invalid request body")]
    InvalidRequest,
    #[error("{error}")]
    Rejected { error: String, code: String },
    #[error("Payment verification failed")]
    LedgerFailure,
}

impl ResponseError for VerificationError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::SessionMismatch => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Rejected { .. } => StatusCode::BAD_REQUEST,
            Self::LedgerFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Rejected { error, code } => json!({ "error": error, "code": code, "success": false }),
            _ => json!({ "error": self.to_string(), "success": false }),
        };
        json_response(self.status_code(), body)
    }
}

//-------------------------------------------------  Webhooks  ---------------------------------------------------------
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing Razorpay signature")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Webhook processing failed")]
    InvalidJson,
    #[error("Invalid webhook payload structure")]
    InvalidPayload,
    #[error("Error processing webhook")]
    ProcessingError,
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingSignature => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::InvalidJson => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::ProcessingError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_response(self.status_code(), json!({ "error": self.to_string() }))
    }
}
