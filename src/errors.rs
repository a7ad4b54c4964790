use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// Failure to read the payload of a session token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    Malformed,
    Base64(String),
    Json(String),
    MissingExp,
    Expired,
}

impl std::error::Error for TokenError {}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Token must have three dot-separated segments"),
            TokenError::Base64(msg) => write!(f, "Token payload is not base64url: {}", msg),
            TokenError::Json(msg) => write!(f, "Token payload is not a JSON object: {}", msg),
            TokenError::MissingExp => write!(f, "Token payload has no numeric exp claim"),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreError(pub String);

impl std::error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session store error: {}", self.0)
    }
}

/// Errors raised by the backend HTTP collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401 from the backend. The session must be treated as invalid.
    Unauthorized,
    Status(u16, String),
    Network(String),
    Decode(String),
}

impl std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Backend rejected the session token"),
            ApiError::Status(code, msg) => write!(f, "Backend returned {}: {}", code, msg),
            ApiError::Network(msg) => write!(f, "Backend unreachable: {}", msg),
            ApiError::Decode(msg) => write!(f, "Unexpected backend response: {}", msg),
        }
    }
}

/// Why an edit handle could not be written or used.
#[derive(Debug, Clone, PartialEq)]
pub enum HandoffError {
    /// The snapshot alone would not fit in the handoff budget.
    TooLarge { bytes: usize, budget: usize },
    /// The form was loaded from a handle that has since been replaced.
    Stale,
    Store(StoreError),
}

impl std::error::Error for HandoffError {}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::TooLarge { bytes, budget } => write!(
                f,
                "Record is too large to hand to the form ({} bytes, limit {})",
                bytes, budget
            ),
            HandoffError::Stale => write!(
                f,
                "This form was opened for a record that is no longer being edited, reload it"
            ),
            HandoffError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl From<StoreError> for HandoffError {
    fn from(e: StoreError) -> Self {
        HandoffError::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

/// Handler-level error. Every variant renders to a response.
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Validation(Vec<FieldError>),
    Api(ApiError),
    Store(StoreError),
    BadRequest(String),
    Conflict(String),
    PayloadTooLarge(String),
}

impl std::error::Error for AppError {}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "Session is no longer valid"),
            AppError::Validation(errors) => write!(f, "{} field(s) failed validation", errors.len()),
            AppError::Api(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized => AppError::Unauthorized,
            other => AppError::Api(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<HandoffError> for AppError {
    fn from(e: HandoffError) -> Self {
        match e {
            HandoffError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            HandoffError::Stale => AppError::Conflict(e.to_string()),
            HandoffError::Store(inner) => AppError::Store(inner),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Api(ApiError::Network(_)) => StatusCode::SERVICE_UNAVAILABLE,
            // Client errors from the backend (bad credentials, duplicates) pass through
            AppError::Api(ApiError::Status(code, _)) if (400..500).contains(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::build(self.status_code())
                .json(serde_json::json!({ "errors": errors })),
            AppError::Api(ApiError::Status(_, msg)) => {
                HttpResponse::build(self.status_code()).json(serde_json::json!({ "message": msg }))
            }
            other => HttpResponse::build(other.status_code())
                .json(serde_json::json!({ "message": other.to_string() })),
        }
    }
}
