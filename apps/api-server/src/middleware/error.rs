//! Error handling - RFC 7807 compliant responses.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use quill_core::ports::AuthError;
use quill_core::{DomainError, RepoError};
use quill_shared::ErrorResponse;

pub const FORBIDDEN_MESSAGE: &str = "권한이 없습니다";
pub const DEACTIVATED_MESSAGE: &str = "탈퇴한 사용자입니다";
pub const SELF_FOLLOW_MESSAGE: &str = "Can't self follow";

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0:?}")]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("{title}: {detail}")]
    Unauthorized { title: &'static str, detail: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(title: &'static str, detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            title,
            detail: detail.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Validation(errors) => ErrorResponse::validation(errors.clone()),
            AppError::Unauthorized { title, detail } => {
                ErrorResponse::unauthorized(*title).with_detail(detail)
            }
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{entity_type} with id {id} not found"))
            }
            DomainError::Validation(errors) => AppError::Validation(errors.fields().clone()),
            DomainError::AuthenticationRequired => AppError::unauthorized(
                "Authentication Required",
                "자격 인증데이터(authentication credentials)가 제공되지 않았습니다.",
            ),
            DomainError::InvalidCredentials => AppError::unauthorized(
                "Invalid Credentials",
                "지정된 자격 증명에 해당하는 활성화된 사용자를 찾을 수 없습니다",
            ),
            DomainError::AuthorizationDenied => AppError::Forbidden(FORBIDDEN_MESSAGE.to_string()),
            DomainError::Deactivated { .. } => AppError::NotFound(DEACTIVATED_MESSAGE.to_string()),
            DomainError::SelfFollow => AppError::BadRequest(SELF_FOLLOW_MESSAGE.to_string()),
            DomainError::Repository(err) => err.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => AppError::unauthorized(
                "Token Expired",
                "Your authentication token has expired. Please login again.",
            ),
            AuthError::InvalidToken(msg) => AppError::unauthorized("Invalid Token", msg),
            AuthError::MissingAuth => AppError::unauthorized(
                "Authentication Required",
                "Please provide a valid Bearer token in the Authorization header.",
            ),
            AuthError::InvalidCredentials => DomainError::InvalidCredentials.into(),
            AuthError::HashingError(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_error_status_codes() {
        let cases = [
            (DomainError::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::AuthorizationDenied, StatusCode::FORBIDDEN),
            (DomainError::SelfFollow, StatusCode::BAD_REQUEST),
            (
                DomainError::Deactivated { id: Uuid::new_v4() },
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::not_found("article", Uuid::new_v4()),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::Repository(RepoError::Constraint("users_username_key".into())),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Repository(RepoError::Query("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::from(DomainError::Validation(
            quill_core::ValidationErrors::field("title", "too long"),
        ));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, AppError::Validation(ref fields) if fields.contains_key("title")));
    }
}
