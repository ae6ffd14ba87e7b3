//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses carry a JSON body of the form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tokoku_core::PriceOverflow;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout or order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Cart storage failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the server's fault (reported to Sentry).
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Cart(
                    CartError::Session(_) | CartError::Serialize(_) | CartError::Unavailable
                )
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Order(
                    OrderError::PersistenceFailure(_)
                        | OrderError::Cart(
                            CartError::Session(_)
                                | CartError::Serialize(_)
                                | CartError::Unavailable
                        )
                )
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(CartError::TotalTooLarge(_))
            | Self::Order(OrderError::Cart(CartError::TotalTooLarge(_))) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::Internal(_) | Self::Cart(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                OrderError::EmptyCart
                | OrderError::TotalTooLarge(_)
                | OrderError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                OrderError::OrderNotFound => StatusCode::NOT_FOUND,
                OrderError::IllegalTransition(_) | OrderError::Conflict(_) => StatusCode::CONFLICT,
                OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderError::Cart(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn client_message(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Cart(CartError::TotalTooLarge(e))
            | Self::Order(OrderError::Cart(CartError::TotalTooLarge(e))) => e.to_string(),
            Self::Database(_) | Self::Internal(_) | Self::Cart(_) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Order(err) => match err {
                OrderError::PersistenceFailure(_) => {
                    "Orders are temporarily unavailable, please try again".to_string()
                }
                OrderError::Cart(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));

        (status, body).into_response()
    }
}

impl From<PriceOverflow> for AppError {
    fn from(e: PriceOverflow) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokoku_core::{IllegalTransition, OrderStatus};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_error_status_codes() {
        let cases = [
            (OrderError::NotAuthenticated, StatusCode::UNAUTHORIZED),
            (OrderError::EmptyCart, StatusCode::BAD_REQUEST),
            (OrderError::OrderNotFound, StatusCode::NOT_FOUND),
            (
                OrderError::InvalidStatus(tokoku_core::InvalidStatus("x".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::IllegalTransition(IllegalTransition {
                    from: OrderStatus::Completed,
                    to: OrderStatus::Cancelled,
                }),
                StatusCode::CONFLICT,
            ),
            (
                OrderError::Forbidden("no".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                OrderError::Conflict("dup".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                OrderError::PersistenceFailure(RepositoryError::Unavailable),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (OrderError::TotalTooLarge(PriceOverflow), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(get_status(AppError::Order(err)), expected);
        }
    }

    #[tokio::test]
    async fn test_cart_total_too_large_is_client_error() {
        let err = AppError::Cart(CartError::TotalTooLarge(PriceOverflow));
        assert!(!err.is_server_error());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("largest supported price"));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Database(RepositoryError::DataCorruption(
            "secret column value".to_string(),
        ))
        .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
