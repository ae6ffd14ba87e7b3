//! Database operations for the storefront.
//!
//! # Database: `tokoku`
//!
//! ## Tables
//!
//! - `users` - Accounts with argon2 password hashes and a role
//! - `products` - Catalog
//! - `reviews` - Product ratings and comments, cascaded on product delete
//! - `profiles` - Per-user address and phone
//! - `orders` - Checkout snapshots with a mutable status
//! - `tower_sessions.session` - Session storage (carts and identities)
//!
//! # Backends
//!
//! Each table is reached through a storage trait ([`OrderStore`],
//! [`CatalogStore`], [`ReviewStore`], [`ProfileStore`], [`UserStore`]) implemented by a `PostgreSQL` repository
//! and by [`MemoryDatabase`]. [`Database`] picks one at startup.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p tokoku-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod reviews;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tokoku_core::{CheckoutKey, Email, OrderId, OrderStatus, ProductId, Role, UserId};

pub use memory::MemoryDatabase;
pub use orders::{CreatedOrder, OrderStore, PgOrderRepository};
pub use products::{CatalogStore, PgProductRepository};
pub use profiles::{PgProfileRepository, ProfileStore};
pub use reviews::{PgReviewRepository, ReviewStore};
pub use users::{PgUserRepository, UserStore};

use crate::models::{
    NewOrder, NewProduct, NewReview, Order, Product, Profile, ProfileUpdate, Review, User,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backend refused the operation (memory backend outage simulation).
    #[error("storage unavailable")]
    Unavailable,
}

/// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// The storage backend chosen at startup.
///
/// Cheap to clone; both variants share their underlying state.
#[derive(Clone)]
pub enum Database {
    Postgres(PgPool),
    Memory(Arc<MemoryDatabase>),
}

impl Database {
    /// A fresh, empty in-memory database.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryDatabase::new()))
    }

    /// The `PostgreSQL` pool, if this is the durable backend.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            Self::Memory(_) => None,
        }
    }

    /// Check the backend can serve queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(mem) => mem.ping(),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres(_) => f.write_str("Database::Postgres"),
            Self::Memory(_) => f.write_str("Database::Memory"),
        }
    }
}

impl OrderStore for Database {
    async fn create_if_absent(&self, order: &NewOrder) -> Result<CreatedOrder, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgOrderRepository::new(pool).create_if_absent(order).await,
            Self::Memory(mem) => mem.create_if_absent(order).await,
        }
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgOrderRepository::new(pool).get(id).await,
            Self::Memory(mem) => OrderStore::get(&**mem, id).await,
        }
    }

    async fn get_by_checkout_key(
        &self,
        key: CheckoutKey,
    ) -> Result<Option<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgOrderRepository::new(pool).get_by_checkout_key(key).await,
            Self::Memory(mem) => mem.get_by_checkout_key(key).await,
        }
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new_status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                PgOrderRepository::new(pool)
                    .update_status(id, expected, new_status)
                    .await
            }
            Self::Memory(mem) => mem.update_status(id, expected, new_status).await,
        }
    }

    async fn list_by_owner(&self, owner: &Email) -> Result<Vec<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgOrderRepository::new(pool).list_by_owner(owner).await,
            Self::Memory(mem) => mem.list_by_owner(owner).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgOrderRepository::new(pool).list_all().await,
            Self::Memory(mem) => OrderStore::list_all(&**mem).await,
        }
    }
}

impl CatalogStore for Database {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgProductRepository::new(pool).list().await,
            Self::Memory(mem) => mem.list().await,
        }
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        match self {
            Self::Postgres(pool) => CatalogStore::get(&PgProductRepository::new(pool), id).await,
            Self::Memory(mem) => CatalogStore::get(&**mem, id).await,
        }
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgProductRepository::new(pool).create(product).await,
            Self::Memory(mem) => CatalogStore::create(&**mem, product).await,
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgProductRepository::new(pool).delete(id).await,
            Self::Memory(mem) => CatalogStore::delete(&**mem, id).await,
        }
    }
}

impl ReviewStore for Database {
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgReviewRepository::new(pool).list_reviews(product_id).await,
            Self::Memory(mem) => mem.list_reviews(product_id).await,
        }
    }

    async fn create_review(
        &self,
        product_id: ProductId,
        author: &Email,
        review: &NewReview,
    ) -> Result<Review, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                PgReviewRepository::new(pool)
                    .create_review(product_id, author, review)
                    .await
            }
            Self::Memory(mem) => mem.create_review(product_id, author, review).await,
        }
    }
}

impl ProfileStore for Database {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgProfileRepository::new(pool).get_profile(user_id).await,
            Self::Memory(mem) => mem.get_profile(user_id).await,
        }
    }

    async fn upsert_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                PgProfileRepository::new(pool)
                    .upsert_profile(user_id, update)
                    .await
            }
            Self::Memory(mem) => mem.upsert_profile(user_id, update).await,
        }
    }
}

impl UserStore for Database {
    async fn create(
        &self,
        email: &Email,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                UserStore::create(&PgUserRepository::new(pool), email, full_name, password_hash)
                    .await
            }
            Self::Memory(mem) => {
                UserStore::create(&**mem, email, full_name, password_hash).await
            }
        }
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgUserRepository::new(pool).get_by_email(email).await,
            Self::Memory(mem) => mem.get_by_email(email).await,
        }
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgUserRepository::new(pool).get_password_hash(email).await,
            Self::Memory(mem) => mem.get_password_hash(email).await,
        }
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<bool, RepositoryError> {
        match self {
            Self::Postgres(pool) => PgUserRepository::new(pool).set_role(email, role).await,
            Self::Memory(mem) => mem.set_role(email, role).await,
        }
    }
}
