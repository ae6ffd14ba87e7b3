//! Catalog persistence.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use tokoku_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product};

/// Storage seam for the product catalog.
pub trait CatalogStore: Send + Sync {
    /// All products, oldest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn get(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn create(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Remove a product and its reviews. Returns `false` if it did not exist.
    ///
    /// Orders are untouched: their line items are snapshots.
    fn delete(&self, id: ProductId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

impl<T: CatalogStore> CatalogStore for std::sync::Arc<T> {
    fn list(&self) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send {
        (**self).list()
    }

    fn get(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send {
        (**self).get(id)
    }

    fn create(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send {
        (**self).create(product)
    }

    fn delete(&self, id: ProductId) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        (**self).delete(id)
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    price: Decimal,
    image: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            price: Price::new(row.price),
            image: row.image,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// `PostgreSQL` product repository.
pub struct PgProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgProductRepository<'_> {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, price, image, description, created_at
            FROM products
            ORDER BY id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, price, image, description, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (title, price, image, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, price, image, description, created_at
            ",
        )
        .bind(product.title.trim())
        .bind(product.price)
        .bind(product.image.as_deref())
        .bind(product.description.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(Product::from(row))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
