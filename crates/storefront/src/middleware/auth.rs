//! Authentication extractors.
//!
//! The signed-in [`Identity`] lives in the session under
//! [`session_keys::IDENTITY`]. Rejections are JSON bodies so API clients can
//! redirect to their own login screen.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use tokoku_core::{Identity, Role};

use crate::models::session_keys;

/// Extractor that requires a signed-in identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
pub struct RequireAuth(pub Identity);

/// Extractor that requires an identity with [`Role::Admin`].
pub struct RequireAdmin(pub Identity);

/// Error returned when authentication or a role is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No identity in the session.
    Unauthorized,
    /// Signed in without the required role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Sign in required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Read the identity from the session stored in request extensions.
async fn session_identity(parts: &Parts) -> Option<Identity> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts.extensions.get::<Session>()?;
    match session.get::<Identity>(session_keys::IDENTITY).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable identity in session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_identity(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = session_identity(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;
        if !identity.has_role(Role::Admin) {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(identity))
    }
}

/// Extractor that optionally gets the signed-in identity.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_identity(parts).await))
    }
}

/// Store `identity` in the session (login).
///
/// The session id is cycled first so a pre-login session id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_identity(
    session: &Session,
    identity: &Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::IDENTITY, identity).await
}

/// Remove the identity from the session (logout). The cart stays.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Identity>(session_keys::IDENTITY).await?;
    Ok(())
}
