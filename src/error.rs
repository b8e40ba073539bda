// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::services::branch_service::BranchError;

/// Every failure a handler can report.
///
/// `Validation` and `Failure` are business outcomes and keep the
/// `result` discriminator the clients switch on. The remaining variants
/// are the generic error tier: `{result: "error", message, code}`.
#[derive(Debug)]
pub enum ApiError {
    // 200 {result: "validation err"}
    Validation(String),

    // 400 {result: "failure"}
    Failure(String),

    // 400
    BadRequest(String),
    InvalidId(String),

    // 404
    NotFound(String),

    // 500
    InternalServerError(String),

    // 503
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::OK,
            ApiError::Failure(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg) => msg,
            ApiError::Failure(msg) => msg,
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidId(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Value of the `result` discriminator in the response body
    pub fn result(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation err",
            ApiError::Failure(_) => "failure",
            _ => "error",
        }
    }

    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            ApiError::Validation(_) | ApiError::Failure(_) => None,
            ApiError::BadRequest(_) => Some("BAD_REQUEST"),
            ApiError::InvalidId(_) => Some("INVALID_ID"),
            ApiError::NotFound(_) => Some("NOT_FOUND"),
            ApiError::InternalServerError(_) => Some("INTERNAL_SERVER_ERROR"),
            ApiError::ServiceUnavailable(_) => Some("SERVICE_UNAVAILABLE"),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "result": self.result(),
            "message": self.message(),
        });
        if let Some(code) = self.error_code() {
            body["code"] = json!(code);
        }
        body
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiError::Failure(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        ApiError::InvalidId(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            DatabaseError::Conflict(msg) => ApiError::validation(msg),
            DatabaseError::ConfigMissing(key) => {
                tracing::error!("Store misconfigured, missing {}", key);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) => {
                tracing::error!("Database pool timed out");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<BranchError> for ApiError {
    fn from(err: BranchError) -> Self {
        match err {
            BranchError::SelfShare | BranchError::AlreadyShared => {
                ApiError::validation(err.to_string())
            }
            BranchError::UserNotFound(_)
            | BranchError::BranchNotFound(_)
            | BranchError::RecipientNotFound(_)
            | BranchError::NoteAuthorNotFound(_) => ApiError::not_found(err.to_string()),
            BranchError::Database(db_err) => db_err.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
