//! Authentication route handlers.
//!
//! Password registration and login. A successful login stores the user's
//! [`Identity`] in the session; the cart in the same session is kept.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use tokoku_core::{Email, Identity, Role, UserId};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_identity, set_identity};
use crate::models::User;
use crate::services::AuthError;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// The signed-in account as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl From<&User> for AccountResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

async fn start_session(session: &Session, user: &User) -> Result<Identity> {
    let identity = user.identity();
    set_identity(session, &identity)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store identity: {e}")))?;
    set_sentry_user(&identity.user_id, Some(identity.email.as_str()));
    Ok(identity)
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign it in.
///
/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<Response> {
    let user = state
        .auth()
        .register(&body.email, &body.password, body.full_name.as_deref())
        .await?;
    start_session(&session, &user).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&user))).into_response())
}

/// Sign in with email and password.
///
/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    let user = state.auth().login(&body.email, &body.password).await?;
    let identity = start_session(&session, &user).await?;
    tracing::info!(user_id = %identity.user_id, "user logged in");

    Ok(Json(AccountResponse::from(&user)))
}

/// Sign out. The cart stays in the session.
///
/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_identity(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear identity: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in account, with its role re-read from storage.
///
/// GET /api/auth/me
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<AccountResponse>> {
    let user = match state.auth().refresh(&identity).await {
        Ok(user) => user,
        Err(AuthError::UserNotFound) => {
            let _ = clear_identity(&session).await;
            return Err(AppError::Unauthorized("Sign in required".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if user.role != identity.role {
        // Pick up roles granted or revoked since login.
        session
            .insert(crate::models::session_keys::IDENTITY, user.identity())
            .await
            .map_err(|e| AppError::Internal(format!("failed to store identity: {e}")))?;
    }

    Ok(Json(AccountResponse::from(&user)))
}
