//! Account profile route handlers.
//!
//! The profile holds the delivery address and phone number of the signed-in
//! user. Updates merge: a field left out of the request keeps its value.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use tokoku_core::Email;

use crate::db::ProfileStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

/// Profile as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub email: Email,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileView {
    fn new(email: Email, profile: Option<Profile>) -> Self {
        match profile {
            Some(p) => Self {
                email,
                address: p.address,
                phone: p.phone,
                updated_at: Some(p.updated_at),
            },
            None => Self {
                email,
                address: None,
                phone: None,
                updated_at: None,
            },
        }
    }
}

/// The caller's profile. Empty fields until the first update.
///
/// GET /api/account/profile
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<ProfileView>> {
    let profile = state.db().get_profile(identity.user_id).await?;
    Ok(Json(ProfileView::new(identity.email, profile)))
}

/// Set the caller's address and/or phone number.
///
/// PUT /api/account/profile
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>> {
    let update = body.normalize().map_err(AppError::BadRequest)?;
    let profile = state
        .db()
        .upsert_profile(identity.user_id, &update)
        .await?;
    tracing::info!("profile updated");
    Ok(Json(ProfileView::new(identity.email, Some(profile))))
}
