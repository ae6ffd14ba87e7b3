//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::config::StorefrontConfig;
use crate::db::Database;
use crate::services::{AuthService, CartEvents, CartStore, Catalog, OrderService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the storage backend and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    db: Database,
    catalog: Catalog<Database>,
    cart_events: CartEvents,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `db` - Storage backend (`PostgreSQL` or memory)
    #[must_use]
    pub fn new(config: StorefrontConfig, db: Database) -> Self {
        let catalog = Catalog::new(db.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                catalog,
                cart_events: CartEvents::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the cached product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog<Database> {
        &self.inner.catalog
    }

    /// Get a reference to the cart change channel.
    #[must_use]
    pub fn cart_events(&self) -> &CartEvents {
        &self.inner.cart_events
    }

    /// The cart held in `session`, wired to the shared change channel.
    #[must_use]
    pub fn cart(&self, session: Session) -> CartStore<Session> {
        CartStore::new(session, self.inner.cart_events.clone())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_, Database> {
        OrderService::new(&self.inner.db)
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_, Database> {
        AuthService::new(&self.inner.db)
    }
}
