use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parley_core::{AccountError, AuthError};

#[derive(Debug)]
pub enum AppError {
    Auth(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Plain-text bodies: the client string-compares success responses.
        let (status, message) = match self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        AppError::Internal("Internal server error".to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::DuplicateUsername | AccountError::InvalidInput => {
                AppError::BadRequest(e.to_string())
            }
            AccountError::Hash(_) | AccountError::Parse(_) | AccountError::Io(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            // One generic message for both causes so usernames can't be
            // enumerated through the login endpoint.
            AuthError::UnknownAccount | AuthError::BadPassword => {
                AppError::Auth("Invalid credentials".to_string())
            }
            AuthError::Hash(_) => AppError::Internal(e.to_string()),
        }
    }
}
