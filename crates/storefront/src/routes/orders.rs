//! Order route handlers.
//!
//! Orders are visible to their owner and to admins. An order that exists but
//! belongs to someone else answers 404, the same as a missing one.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tokoku_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::StatusOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub new_status: String,
}

/// Result of a status change.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub order: Order,
    pub message: String,
    pub unchanged: bool,
}

impl From<StatusOutcome> for StatusResponse {
    fn from(outcome: StatusOutcome) -> Self {
        let message = outcome.message();
        let unchanged = outcome.is_unchanged();
        Self {
            order: outcome.into_order(),
            message,
            unchanged,
        }
    }
}

/// Orders visible to the caller, newest first.
///
/// GET /api/orders
#[instrument(skip_all, fields(actor = %identity.email))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = state.orders().list_for(&identity).await?;
    Ok(Json(orders))
}

/// GET /api/orders/{id}
#[instrument(skip_all, fields(actor = %identity.email, order_id = id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    let order = state.orders().get_for(&identity, OrderId::new(id)).await?;
    Ok(Json(order))
}

/// Change an order's status.
///
/// PUT /api/orders/{id}/status
#[instrument(skip_all, fields(actor = %identity.email, order_id = id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>> {
    let outcome = state
        .orders()
        .set_status(&identity, OrderId::new(id), &body.new_status)
        .await?;
    Ok(Json(outcome.into()))
}

/// Confirm payment for an order, completing it.
///
/// POST /api/orders/{id}/confirm
#[instrument(skip_all, fields(actor = %identity.email, order_id = id))]
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>> {
    let outcome = state
        .orders()
        .confirm_payment(&identity, OrderId::new(id))
        .await?;
    Ok(Json(outcome.into()))
}
