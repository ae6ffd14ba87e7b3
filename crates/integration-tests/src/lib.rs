//! Integration tests for the Tokoku storefront.
//!
//! Each test starts the full application (all middleware, memory storage and
//! memory sessions) on an ephemeral local port and talks to it over HTTP with
//! a cookie-keeping client, so every client gets its own session and cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tokoku-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use tokoku_core::{Price, Role};
use tokoku_storefront::{
    build_app,
    config::StorefrontConfig,
    db::{Database, MemoryDatabase},
    middleware::create_memory_session_layer,
    models::{NewProduct, Product},
    state::AppState,
};

/// Password used by [`TestServer::sign_up`].
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A storefront running in the background for one test.
pub struct TestServer {
    base_url: String,
    state: AppState,
    db: Arc<MemoryDatabase>,
}

impl TestServer {
    /// Start a fresh storefront with empty storage.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let config = StorefrontConfig::for_memory("http://127.0.0.1");
        let session_layer = create_memory_session_layer(&config);
        let state = AppState::new(config, Database::Memory(Arc::clone(&db)));
        let app = build_app(state.clone(), session_layer);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read test listener address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            db,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The storage behind the server, for fault injection.
    #[must_use]
    pub fn db(&self) -> &MemoryDatabase {
        &self.db
    }

    /// A new client with its own cookie jar (its own session and cart).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Add a catalog product directly.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be stored.
    pub async fn seed_product(&self, title: &str, price: i64) -> Product {
        self.state
            .catalog()
            .create(&NewProduct {
                title: title.to_string(),
                price: Price::from_units(price),
                image: None,
                description: None,
            })
            .await
            .expect("Failed to seed product")
    }

    /// Register `email` with `client`, leaving it signed in.
    ///
    /// # Panics
    ///
    /// Panics if registration does not answer 201.
    pub async fn sign_up(&self, client: &Client, email: &str) {
        let resp = client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("register request failed");
        assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");
    }

    /// Register `email` as an admin and sign `client` in with the new role.
    ///
    /// # Panics
    ///
    /// Panics if any step fails.
    pub async fn sign_up_admin(&self, client: &Client, email: &str) {
        self.sign_up(client, email).await;
        self.state
            .auth()
            .set_role(email, Role::Admin)
            .await
            .expect("Failed to grant admin");
        let me = get_json(client, &self.url("/api/auth/me")).await;
        assert_eq!(me["role"], "admin");
    }

    /// Add one unit of `product` to `client`'s cart.
    ///
    /// # Panics
    ///
    /// Panics if the request does not succeed.
    pub async fn add_to_cart(&self, client: &Client, product: &Product) -> Value {
        let resp = client
            .post(self.url("/api/cart/add"))
            .json(&json!({ "productId": product.id }))
            .send()
            .await
            .expect("add to cart failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.expect("cart body")
    }
}

/// GET `url` and decode a JSON body, asserting 200.
///
/// # Panics
///
/// Panics on transport errors, a non-200 status or a non-JSON body.
pub async fn get_json(client: &Client, url: &str) -> Value {
    let resp = client.get(url).send().await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK, "GET {url}");
    resp.json().await.expect("JSON body")
}

/// Status and decoded JSON body of `resp`.
///
/// # Panics
///
/// Panics if the body is not JSON.
pub async fn status_and_json(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.expect("JSON body");
    (status, body)
}
