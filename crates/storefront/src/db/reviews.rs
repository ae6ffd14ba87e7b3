//! Product review persistence.

use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::{Email, ProductId, ReviewId};

use super::RepositoryError;
use crate::models::review::{NewReview, Review};

/// Storage seam for product reviews.
pub trait ReviewStore: Send + Sync {
    /// Reviews of `product_id`, newest first.
    fn list_reviews(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<Review>, RepositoryError>> + Send;

    /// Store a validated review. The comment is stored trimmed.
    fn create_review(
        &self,
        product_id: ProductId,
        author: &Email,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, RepositoryError>> + Send;
}

impl<T: ReviewStore> ReviewStore for std::sync::Arc<T> {
    fn list_reviews(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<Review>, RepositoryError>> + Send {
        (**self).list_reviews(product_id)
    }

    fn create_review(
        &self,
        product_id: ProductId,
        author: &Email,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, RepositoryError>> + Send {
        (**self).create_review(product_id, author, review)
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    product_id: i64,
    author: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let author = Email::parse(&r.author).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid review author in database: {e}"))
        })?;
        let rating = u8::try_from(r.rating).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {}", r.rating))
        })?;

        Ok(Self {
            id: ReviewId::new(r.id),
            product_id: ProductId::new(r.product_id),
            author,
            rating,
            comment: r.comment,
            created_at: r.created_at,
        })
    }
}

/// `PostgreSQL` review repository.
pub struct PgReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl ReviewStore for PgReviewRepository<'_> {
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, product_id, author, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn create_review(
        &self,
        product_id: ProductId,
        author: &Email,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO reviews (product_id, author, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, author, rating, comment, created_at
            ",
        )
        .bind(product_id)
        .bind(author.as_str())
        .bind(i16::from(review.rating))
        .bind(review.comment.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Review::try_from(row)
    }
}
