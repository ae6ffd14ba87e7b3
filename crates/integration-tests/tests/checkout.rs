//! Checkout over HTTP: authentication, idempotency, cart clearing.

use reqwest::StatusCode;
use serde_json::json;
use tokoku_integration_tests::{TestServer, get_json, status_and_json};
use uuid::Uuid;

#[tokio::test]
async fn test_checkout_creates_order_and_clears_cart() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi Susu", 25_000).await;
    let teh = server.seed_product("Teh Tarik", 18_000).await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;

    server.add_to_cart(&client, &kopi).await;
    server.add_to_cart(&client, &kopi).await;
    server.add_to_cart(&client, &teh).await;

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    let (status, order) = status_and_json(resp).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["ownerIdentity"], "budi@example.com");
    assert_eq!(order["status"], "pending_payment");
    assert_eq!(order["totalPrice"], "68000");
    let lines = order["lineItemsSnapshot"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["title"], "Kopi Susu");
    assert_eq!(lines[0]["quantity"], 2);

    let cart = get_json(&client, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_checkout_requires_sign_in_and_keeps_cart() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let client = server.client();
    server.add_to_cart(&client, &kopi).await;

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Signing in keeps the anonymous cart, so checkout now succeeds.
    server.sign_up(&client, "sari@example.com").await;
    let cart = get_json(&client, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 1);

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let server = TestServer::start().await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    let (status, body) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");
}

#[tokio::test]
async fn test_retry_with_same_key_returns_same_order() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;
    server.add_to_cart(&client, &kopi).await;

    let key = Uuid::new_v4().to_string();
    let first = client
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    let (status, first) = status_and_json(first).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["requestId"], key.as_str());

    let retry = client
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    let (status, retry) = status_and_json(retry).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retry["id"], first["id"]);

    let orders = get_json(&client, &server.url("/api/orders")).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reused_key_with_refilled_cart_keeps_cart() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let teh = server.seed_product("Teh", 8_000).await;
    let gula = server.seed_product("Gula", 12_000).await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;
    server.add_to_cart(&client, &kopi).await;

    let key = Uuid::new_v4().to_string();
    let resp = client
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    server.add_to_cart(&client, &teh).await;
    server.add_to_cart(&client, &gula).await;
    let resp = client
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    let (status, body) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "checkout key already used for a different cart");

    let cart = get_json(&client, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 2);
    let orders = get_json(&client, &server.url("/api/orders")).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_request_id_in_body_is_honored() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;
    server.add_to_cart(&client, &kopi).await;

    let key = Uuid::new_v4();
    let resp = client
        .post(server.url("/api/cart/checkout"))
        .json(&json!({ "requestId": key }))
        .send()
        .await
        .unwrap();
    let (status, order) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["requestId"], key.to_string());
}

#[tokio::test]
async fn test_key_reused_by_another_owner_conflicts() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let key = Uuid::new_v4().to_string();

    let budi = server.client();
    server.sign_up(&budi, "budi@example.com").await;
    server.add_to_cart(&budi, &kopi).await;
    let resp = budi
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let sari = server.client();
    server.sign_up(&sari, "sari@example.com").await;
    server.add_to_cart(&sari, &kopi).await;
    let resp = sari
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", &key)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Sari's cart survives the failed attempt.
    let cart = get_json(&sari, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 1);
}

#[tokio::test]
async fn test_malformed_idempotency_key_is_rejected() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .header("Idempotency-Key", "order-1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_failure_keeps_cart() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi", 10_000).await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;
    server.add_to_cart(&client, &kopi).await;

    server.db().set_unavailable(true);
    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let ready = client
        .get(server.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    server.db().set_unavailable(false);
    let cart = get_json(&client, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 1);
}
