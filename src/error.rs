//! Error taxonomy for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Authentication failures. The sub-kinds are distinct on purpose: the
/// client reacts differently to a token that expired (re-login) and a
/// request that was malformed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no authentication token supplied")]
    TokenMissing,
    #[error("token is invalid")]
    TokenInvalid,
    #[error("token has expired, please log in again")]
    TokenExpired,
    #[error("invalid username or password")]
    BadCredentials,
}

impl AuthError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TokenMissing => "token_missing",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::BadCredentials => "bad_credentials",
        }
    }
}

/// Errors a handler can surface to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input the caller can correct.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Covers both a record that does not exist and a record owned by
    /// someone else. Collapsing the two keeps foreign ids unenumerable.
    #[error("todo not found")]
    NotFound,

    /// Duplicate username or email at registration.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected persistence-layer fault. Detail stays in the server log.
    #[error("storage failure")]
    Storage(sqlx::Error),

    /// Anything else that should never happen in a healthy process
    /// (password hashing, token signing).
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(e) => e.kind(),
            Self::NotFound => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) | Self::Internal(_) => "internal",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                let message = match db_err.constraint() {
                    Some("users_username_key") => "username already taken",
                    Some("users_email_key") => "email already registered",
                    _ => "record already exists",
                };
                return Self::Conflict(message.into());
            }
        }
        Self::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal detail is logged here and never echoed to the client.
        let message = match &self {
            Self::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                "internal server error".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "error": self.kind(), "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::Validation("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized(AuthError::TokenMissing).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthorized(AuthError::TokenExpired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("username already taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Storage(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_error_kinds_are_distinct() {
        let kinds = [
            AuthError::TokenMissing.kind(),
            AuthError::TokenInvalid.kind(),
            AuthError::TokenExpired.kind(),
            AuthError::BadCredentials.kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn storage_errors_do_not_leak_detail() {
        let err = ApiError::Storage(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
