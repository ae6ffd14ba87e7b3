//! Product catalog with a read-through cache.
//!
//! Catalog reads are cached with `moka` (5-minute TTL). Creating a product
//! invalidates the list entry so new products show up immediately; deleting
//! one drops both the list and the product entry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use tokoku_core::ProductId;

use crate::db::{CatalogStore, RepositoryError};
use crate::models::{NewProduct, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Cached access to a [`CatalogStore`].
pub struct Catalog<S> {
    inner: Arc<CatalogInner<S>>,
}

struct CatalogInner<S> {
    store: S,
    cache: Cache<CacheKey, CacheValue>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CatalogStore> Catalog<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner { store, cache }),
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = Arc::new(self.inner.store.list().await?);
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A single product, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let Some(product) = self.inner.store.get(id).await? else {
            return Ok(None);
        };
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(Some(product))
    }

    /// Add a product and drop the cached list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let created = self.inner.store.create(product).await?;
        self.inner.cache.invalidate(&CacheKey::Products).await;
        tracing::info!(product_id = %created.id, title = %created.title, "product created");
        Ok(created)
    }

    /// Remove a product. Returns `false` if it did not exist.
    ///
    /// The cache entries are dropped either way so a stale copy cannot
    /// outlive the row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let deleted = self.inner.store.delete(id).await?;
        self.inner.cache.invalidate(&CacheKey::Product(id)).await;
        self.inner.cache.invalidate(&CacheKey::Products).await;
        if deleted {
            tracing::info!("product deleted");
        }
        Ok(deleted)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
