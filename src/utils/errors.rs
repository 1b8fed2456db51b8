use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Already loading: {0}")]
    AlreadyLoading(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {

    /// Maps a non-success status from the clinic API to the matching variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            422 => ApiError::Unprocessable(message),
            _ => ApiError::Upstream { status, message },
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// JSON body sent to the browser: `{ error, code }`, plus `details` for
    /// validation failures.
    pub fn to_json(&self) -> serde_json::Value {
        let code = self.status_code().as_u16();
        match self {
            ApiError::Validation(errors) => serde_json::json!({
                "error": "Datos inválidos",
                "code": code,
                "details": errors
            }),
            _ => serde_json::json!({
                "error": self.message(),
                "code": code
            }),
        }
    }

    /// The bare message, without the variant prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Unprocessable(message)
            | ApiError::Network(message)
            | ApiError::InvalidData(message)
            | ApiError::InternalServerError(message) => message.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::Validation(errors) => errors.join("\n"),
            ApiError::AlreadyLoading(endpoint) => format!("Ya se está cargando: {}", endpoint),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidData(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidData(err.to_string())
    }
}

impl ResponseError for ApiError {

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::AlreadyLoading(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream { .. } | ApiError::InvalidData(_) => StatusCode::BAD_GATEWAY,
            ApiError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_json())
    }
}

// ----------------------------- TESTS --------------------------------
