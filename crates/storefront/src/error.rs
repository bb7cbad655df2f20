//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers that can fail return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ra9ia_core::EmailError;
use thiserror::Error;

use crate::sanity::SanityError;
use crate::services::CartStorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// CMS request failed.
    #[error("CMS error: {0}")]
    Cms(#[from] SanityError),

    /// The visitor's cart could not be saved.
    #[error("Cart storage error: {0}")]
    CartStorage(#[from] CartStorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::BadRequest(format!("Invalid email address: {err}"))
    }
}

impl AppError {
    /// Map a CMS lookup, turning a missing document into [`AppError::NotFound`].
    #[must_use]
    pub fn from_lookup(err: SanityError) -> Self {
        match err {
            SanityError::NotFound(what) => Self::NotFound(what),
            other => Self::Cms(other),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::CartStorage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cms(SanityError::MissingToken) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cms(SanityError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cms(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::CartStorage(_) => "Internal server error".to_string(),
            Self::Cms(SanityError::MissingToken) => {
                "Restock sign-ups are not available right now".to_string()
            }
            Self::Cms(SanityError::NotFound(_)) => "Not found".to_string(),
            Self::Cms(_) => "External service error".to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::NotFound(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product abaya-noir".to_string());
        assert_eq!(err.to_string(), "Not found: product abaya-noir");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cms(SanityError::RateLimited(3))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Cms(SanityError::MissingToken)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_lookup_not_found() {
        let err = AppError::from_lookup(SanityError::NotFound("partner amira".to_string()));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_invalid_email_is_bad_request() {
        let err = AppError::from(EmailError::Empty);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
