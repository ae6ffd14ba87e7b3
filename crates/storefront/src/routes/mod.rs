//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (storage reachable)
//!
//! # Products
//! GET  /api/products               - Catalog listing
//! GET  /api/products/{id}          - Product detail
//! POST /api/products               - Create product (admin)
//! DELETE /api/products/{id}        - Delete product (admin)
//! GET  /api/products/{id}/reviews  - Reviews and average rating
//! POST /api/products/{id}/reviews  - Add a review (requires auth)
//!
//! # Cart (session scoped)
//! GET  /api/cart                   - Cart contents and total
//! POST /api/cart/add               - Add one unit of a product
//! POST /api/cart/update            - Step a line's quantity
//! POST /api/cart/remove            - Remove a line
//! POST /api/cart/clear             - Empty the cart
//! GET  /api/cart/count             - Item count
//! GET  /api/cart/events            - Item count as server-sent events
//! POST /api/cart/checkout          - Create an order from the cart
//!
//! # Orders (requires auth)
//! GET  /api/orders                 - Orders visible to the caller
//! GET  /api/orders/{id}            - Order detail
//! PUT  /api/orders/{id}/status     - Change status
//! POST /api/orders/{id}/confirm    - Confirm payment
//!
//! # Account (requires auth)
//! GET  /api/account/profile        - Address and phone
//! PUT  /api/account/profile        - Update address and/or phone
//!
//! # Auth
//! POST /api/auth/register          - Create account
//! POST /api/auth/login             - Sign in
//! POST /api/auth/logout            - Sign out
//! GET  /api/auth/me                - Current account
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::config::StorefrontConfig;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show).delete(products::delete))
        .route(
            "/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
        .route("/checkout", post(cart::checkout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(account::profile).put(account::update_profile),
    )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
        .route("/{id}/confirm", post(orders::confirm))
}

/// Create all API routes for the storefront.
///
/// With `auth_rate_limit` set, auth endpoints get the strict per-IP limiter
/// and the rest of the API the relaxed one.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    let auth = auth_routes();
    let api = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/account", account_routes());

    let (auth, api) = if config.auth_rate_limit {
        (
            auth.layer(auth_rate_limiter()),
            api.layer(api_rate_limiter()),
        )
    } else {
        (auth, api)
    };

    Router::new().nest("/api/auth", auth).nest("/api", api)
}
