//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use database::{CoupleError, DatabaseError, FriendError, GameError, ValidationError, WalletError};

/// Errors returned by API handlers. Every variant carries the message the
/// client sees.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid input or state for the requested operation.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Database(DatabaseError::NotFound { entity, .. }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ApiError::Database(DatabaseError::AlreadyExists { entity, .. }) => {
                (StatusCode::BAD_REQUEST, format!("{entity} already exists"))
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "message": message
        });

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<FriendError> for ApiError {
    fn from(err: FriendError) -> Self {
        let message = err.to_string();
        match err {
            FriendError::Database(e) => ApiError::Database(e),
            FriendError::UserNotFound | FriendError::RequestNotFound | FriendError::NotFriends => {
                ApiError::NotFound(message)
            }
            FriendError::NotRecipient => ApiError::Forbidden(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<CoupleError> for ApiError {
    fn from(err: CoupleError) -> Self {
        let message = err.to_string();
        match err {
            CoupleError::Database(e) => ApiError::Database(e),
            CoupleError::UserNotFound => ApiError::NotFound(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let message = err.to_string();
        match err {
            GameError::Database(e) => ApiError::Database(e),
            GameError::SessionNotFound => ApiError::NotFound(message),
            GameError::NotParticipant => ApiError::Forbidden(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let message = err.to_string();
        match err {
            WalletError::Database(e) => ApiError::Database(e),
            WalletError::UserNotFound => ApiError::NotFound(message),
            _ => ApiError::BadRequest(message),
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("Password hashing failed: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("Token signing failed: {err}"))
    }
}

/// Result type for API handlers.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;
