//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use tokoku_core::{CurrencyCode, Price, ProductId};

use crate::db::{RepositoryError, ReviewStore};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewProduct, NewReview, Product, Review, ReviewSummary};
use crate::state::AppState;

/// Product as returned to clients, with a formatted price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub price_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductView {
    fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            price_display: product.price.display(currency),
            image: product.image.clone(),
            description: product.description.clone(),
        }
    }
}

/// List the catalog.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let currency = state.config().currency;
    let products = state.catalog().list().await?;
    Ok(Json(
        products
            .iter()
            .map(|p| ProductView::new(p, currency))
            .collect(),
    ))
}

/// One product.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>> {
    let product = state
        .catalog()
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    Ok(Json(ProductView::new(&product, state.config().currency)))
}

/// Add a product to the catalog.
///
/// POST /api/products (admin only)
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>)> {
    body.validate().map_err(AppError::BadRequest)?;
    let product = state.catalog().create(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductView::new(&product, state.config().currency)),
    ))
}

/// Remove a product from the catalog.
///
/// Placed orders keep their line-item snapshots.
///
/// DELETE /api/products/{id} (admin only)
#[instrument(skip_all, fields(admin = %admin.email, product_id = id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if state.catalog().delete(ProductId::new(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("product {id} not found")))
    }
}

/// Reviews of a product with their average rating.
///
/// GET /api/products/{id}/reviews
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewSummary>> {
    let product_id = ProductId::new(id);
    if state.catalog().get(product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id} not found")));
    }
    let reviews = state.db().list_reviews(product_id).await?;
    Ok(Json(ReviewSummary::new(reviews)))
}

/// Rate and comment on a product as the signed-in user.
///
/// POST /api/products/{id}/reviews (requires auth)
#[instrument(skip_all, fields(user_id = %identity.user_id, product_id = id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    body.validate().map_err(AppError::BadRequest)?;
    let review = state
        .db()
        .create_review(ProductId::new(id), &identity.email, &body)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {id} not found")),
            e => AppError::Database(e),
        })?;
    tracing::info!(review_id = %review.id, rating = review.rating, "review added");
    Ok((StatusCode::CREATED, Json(review)))
}
