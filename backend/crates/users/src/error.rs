//! Users Error Types
//!
//! Crate-level error variants integrating with the unified
//! `kernel::error::AppError` system. Field validation failures keep the
//! per-field wire format; everything else renders as problem details.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::validation::ValidationErrors;
use serde_json::json;
use thiserror::Error;

use crate::domain::gateway::ProviderRejection;

/// Users result type alias
pub type UsersResult<T> = Result<T, UsersError>;

#[derive(Debug, Error)]
pub enum UsersError {
    /// Request payload failed field or object-level validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The verification provider refused the request
    #[error("Verification provider rejected the request: {0}")]
    Provider(ProviderRejection),

    /// The verification provider could not be reached
    #[error("Verification provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not active")]
    AccountInactive,

    /// Too many failed sign-in attempts
    #[error("Account is temporarily locked")]
    AccountLocked,

    /// Session not found or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Session fingerprint mismatch")]
    SessionFingerprintMismatch,

    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// Request body is not valid JSON for the endpoint
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// Activation token verified for an account that is already active
    #[error("Stale token for given user.")]
    StaleToken,

    #[error("Not found.")]
    NotFound,

    /// The activation proxy could not complete the upstream call
    #[error("Account activation failed.")]
    ActivationUnavailable { upstream: serde_json::Value },

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UsersError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UsersError::Validation(_)
            | UsersError::Provider(_)
            | UsersError::MissingHeader(_)
            | UsersError::MalformedBody(_) => ErrorKind::BadRequest,
            UsersError::InvalidCredentials
            | UsersError::SessionInvalid
            | UsersError::SessionFingerprintMismatch => ErrorKind::Unauthorized,
            UsersError::AccountInactive | UsersError::StaleToken => ErrorKind::Forbidden,
            UsersError::AccountLocked => ErrorKind::Locked,
            UsersError::NotFound => ErrorKind::NotFound,
            UsersError::ProviderUnavailable(_) | UsersError::ActivationUnavailable { .. } => {
                ErrorKind::ServiceUnavailable
            }
            UsersError::Mail(_) | UsersError::Database(_) | UsersError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    ///
    /// Server-side details stay in the logs; clients get a generic message.
    pub fn to_app_error(&self) -> AppError {
        match self {
            UsersError::Validation(errors) => AppError::validation(errors.clone()),
            UsersError::Mail(_) | UsersError::Database(_) | UsersError::Internal(_) => {
                AppError::internal("An unexpected error occurred")
            }
            UsersError::ProviderUnavailable(_) => {
                AppError::service_unavailable("Phone verification is temporarily unavailable")
                    .with_action("Try again later")
            }
            UsersError::AccountLocked => AppError::locked(self.to_string())
                .with_action("Wait a few minutes before signing in again"),
            UsersError::AccountInactive => AppError::forbidden(self.to_string())
                .with_action("Activate the account before signing in"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            UsersError::Database(e) => {
                tracing::error!(error = %e, "Users database error");
            }
            UsersError::Mail(msg) => {
                tracing::error!(message = %msg, "Activation mail delivery failed");
            }
            UsersError::Internal(msg) => {
                tracing::error!(message = %msg, "Users internal error");
            }
            UsersError::ProviderUnavailable(msg) => {
                tracing::error!(message = %msg, "Verification provider unavailable");
            }
            UsersError::ActivationUnavailable { upstream } => {
                tracing::warn!(upstream = %upstream, "Activation proxy failed");
            }
            UsersError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            UsersError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            UsersError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            _ => {
                tracing::debug!(error = %self, "Users error");
            }
        }
    }
}

impl IntoResponse for UsersError {
    fn into_response(self) -> Response {
        self.log();
        match self {
            UsersError::Validation(errors) => errors.into_response(),
            UsersError::Provider(rejection) => {
                let mut body = json!({ "message": [rejection.message] });
                if let Some(code) = rejection.error_code {
                    body["error_code"] = json!([code]);
                }
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            UsersError::StaleToken => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "Stale token for given user." })),
            )
                .into_response(),
            UsersError::ActivationUnavailable { upstream } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "detail": "Account activation failed.",
                    "upstream": upstream,
                })),
            )
                .into_response(),
            other => other.to_app_error().into_response(),
        }
    }
}

impl From<ValidationErrors> for UsersError {
    fn from(errors: ValidationErrors) -> Self {
        UsersError::Validation(errors)
    }
}

impl From<JsonRejection> for UsersError {
    fn from(rejection: JsonRejection) -> Self {
        UsersError::MalformedBody(rejection.body_text())
    }
}

impl From<AppError> for UsersError {
    fn from(err: AppError) -> Self {
        match err.fields() {
            Some(fields) => UsersError::Validation(fields.clone()),
            None => UsersError::Internal(err.to_string()),
        }
    }
}

impl From<platform::client::FingerprintError> for UsersError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                UsersError::MissingHeader(header)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::validation::ErrorDetail;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UsersError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(UsersError::AccountInactive.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(UsersError::AccountLocked.status_code(), StatusCode::LOCKED);
        assert_eq!(UsersError::StaleToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            UsersError::ProviderUnavailable("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            UsersError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_renders_field_map() {
        let err = UsersError::from(ValidationErrors::single("email", ErrorDetail::blank()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "email": ["This field may not be blank."] })
        );
    }

    #[tokio::test]
    async fn test_provider_rejection_body() {
        let err = UsersError::Provider(ProviderRejection::new(
            "Phone number is invalid",
            Some("60033".to_string()),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "message": ["Phone number is invalid"], "error_code": ["60033"] })
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = UsersError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("secret detail"));
    }

    #[test]
    fn test_from_app_error_keeps_fields() {
        let app = AppError::validation(ValidationErrors::single("uid", ErrorDetail::invalid("x")));
        assert!(matches!(UsersError::from(app), UsersError::Validation(_)));
        assert!(matches!(
            UsersError::from(AppError::not_found("missing")),
            UsersError::Internal(_)
        ));
    }
}
