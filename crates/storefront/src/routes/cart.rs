//! Cart route handlers.
//!
//! The cart lives in the client's session. Every mutation answers with the
//! updated cart; clients that keep a badge elsewhere follow `/api/cart/events`.

use std::convert::Infallible;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use tokoku_core::{
    CartLine, CheckoutKey, CurrencyCode, Price, PriceOverflow, ProductId, QtyDirection,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::services::cart::{cart_total, item_count};
use crate::state::AppState;

/// Header carrying a client-chosen checkout key.
pub const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// The cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Price,
    pub total_display: String,
    pub item_count: u32,
}

impl CartView {
    fn new(items: Vec<CartLine>, currency: CurrencyCode) -> std::result::Result<Self, PriceOverflow> {
        let total = cart_total(&items)?;
        Ok(Self {
            item_count: item_count(&items),
            total_display: total.display(currency),
            total,
            items,
        })
    }
}

/// Cart badge payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub direction: QtyDirection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub request_id: Option<CheckoutKey>,
}

/// Current cart contents.
///
/// GET /api/cart
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let items = state.cart(session).get_cart().await?;
    Ok(Json(CartView::new(items, state.config().currency)?))
}

/// Add one unit of a catalog product.
///
/// POST /api/cart/add
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {} not found", body.product_id)))?;

    let items = state.cart(session).add_to_cart(&product).await?;
    Ok(Json(CartView::new(items, state.config().currency)?))
}

/// Step a line's quantity up or down.
///
/// POST /api/cart/update
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let items = state
        .cart(session)
        .update_qty(body.product_id, body.direction)
        .await?;
    Ok(Json(CartView::new(items, state.config().currency)?))
}

/// Remove a line.
///
/// POST /api/cart/remove
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let items = state.cart(session).remove_from_cart(body.product_id).await?;
    Ok(Json(CartView::new(items, state.config().currency)?))
}

/// Empty the cart.
///
/// POST /api/cart/clear
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    state.cart(session).clear_cart().await?;
    Ok(Json(CartView::new(Vec::new(), state.config().currency)?))
}

/// Total units in the cart.
///
/// GET /api/cart/count
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<Json<CartCount>> {
    let count = state.cart(session).get_cart_count().await?;
    Ok(Json(CartCount { count }))
}

/// Stream `cart-count` events for this session's cart.
///
/// The current count is sent first, then one event per change. A subscriber
/// that falls behind gets the re-read count instead of the missed events.
///
/// GET /api/cart/events
#[instrument(skip(state, session))]
pub async fn events(
    State(state): State<AppState>,
    session: Session,
) -> Result<Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>>> {
    let cart = state.cart(session);
    let cart_id = cart.cart_id().await?;
    let mut rx = cart.subscribe();
    let initial = cart.get_cart_count().await?;

    let stream = async_stream::stream! {
        yield Ok(count_event(initial));
        loop {
            match rx.recv().await {
                Ok(changed) if changed.cart_id == cart_id => {
                    yield Ok(count_event(changed.item_count));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%cart_id, skipped, "cart event subscriber lagged");
                    match cart.get_cart_count().await {
                        Ok(count) => {
                            yield Ok(count_event(count));
                        }
                        Err(e) => {
                            tracing::warn!(%cart_id, error = %e, "cart unreadable, closing event stream");
                            break;
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn count_event(count: u32) -> Event {
    Event::default()
        .event("cart-count")
        .data(format!(r#"{{"count":{count}}}"#))
}

/// Turn the cart into an order.
///
/// The checkout key comes from the `Idempotency-Key` header, else the body's
/// `requestId`, else a fresh one. Answers 201 for a new order and 200 when the
/// key replays an earlier checkout.
///
/// POST /api/cart/checkout
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    session: Session,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let checkout_key = checkout_key(&headers, &body)?;
    let cart = state.cart(session);

    let key_text = checkout_key.to_string();
    add_breadcrumb(
        "checkout",
        "Checkout requested",
        Some(&[("checkout_key", key_text.as_str())]),
    );

    let result = state
        .orders()
        .checkout(identity.as_ref(), checkout_key, &cart)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result.order)).into_response())
}

fn checkout_key(headers: &HeaderMap, body: &[u8]) -> Result<CheckoutKey> {
    if let Some(value) = headers.get(IDEMPOTENCY_KEY) {
        let raw = value
            .to_str()
            .map_err(|_| AppError::BadRequest("Idempotency-Key must be a UUID".to_string()))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::BadRequest("Idempotency-Key must be a UUID".to_string()))?;
        return Ok(CheckoutKey::from_uuid(id));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CheckoutKey::generate());
    }

    let request: CheckoutRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid checkout request: {e}")))?;
    Ok(request.request_id.unwrap_or_else(CheckoutKey::generate))
}
