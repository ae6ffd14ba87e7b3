//! Accounts, catalog and health endpoints over HTTP.

use reqwest::StatusCode;
use serde_json::json;
use tokoku_integration_tests::{TEST_PASSWORD, TestServer, get_json, status_and_json};

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client
        .get(server.url("/health"))
        .header("x-request-id", "edge-abc.123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "edge-abc.123");

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_register_login_logout() {
    let server = TestServer::start().await;
    let client = server.client();

    let resp = client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "email": "Budi@Example.com",
            "password": TEST_PASSWORD,
            "fullName": "Budi Santoso",
        }))
        .send()
        .await
        .unwrap();
    let (status, account) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["email"], "budi@example.com");
    assert_eq!(account["role"], "customer");
    assert_eq!(account["fullName"], "Budi Santoso");

    let me = get_json(&client, &server.url("/api/auth/me")).await;
    assert_eq!(me["email"], "budi@example.com");

    let resp = client.post(server.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = client.get(server.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "budi@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "budi@example.com", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let server = TestServer::start().await;
    server.sign_up(&server.client(), "budi@example.com").await;

    let resp = server
        .client()
        .post(server.url("/api/auth/register"))
        .json(&json!({ "email": "BUDI@example.com", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = server
        .client()
        .post(server.url("/api/auth/register"))
        .json(&json!({ "email": "sari@example.com", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client()
        .post(server.url("/api/auth/register"))
        .json(&json!({ "email": "not-an-email", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_listing_and_detail() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi Susu", 25_000).await;
    server.seed_product("Teh Tarik", 18_000).await;
    let client = server.client();

    let products = get_json(&client, &server.url("/api/products")).await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["title"], "Kopi Susu");
    assert_eq!(products[0]["price"], "25000");
    assert_eq!(products[0]["priceDisplay"], "Rp 25.000");

    let detail = get_json(&client, &server.url(&format!("/api/products/{}", kopi.id))).await;
    assert_eq!(detail["id"], kopi.id.as_i64());

    let resp = client.get(server.url("/api/products/999")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_admins_create_products() {
    let server = TestServer::start().await;
    let body = json!({ "title": "Es Cendol", "price": "12000" });

    let anonymous = server.client();
    let resp = anonymous
        .post(server.url("/api/products"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let customer = server.client();
    server.sign_up(&customer, "budi@example.com").await;
    let resp = customer
        .post(server.url("/api/products"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = server.client();
    server.sign_up_admin(&admin, "admin@example.com").await;
    let resp = admin
        .post(server.url("/api/products"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let (status, created) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Es Cendol");

    // The catalog cache sees the new product immediately.
    let products = get_json(&anonymous, &server.url("/api/products")).await;
    assert_eq!(products.as_array().unwrap().len(), 1);

    let resp = admin
        .post(server.url("/api/products"))
        .json(&json!({ "title": "  ", "price": "1000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prices_outside_storage_range_are_rejected() {
    let server = TestServer::start().await;
    let admin = server.client();
    server.sign_up_admin(&admin, "admin@example.com").await;

    for price in ["79228162514264337593543950335", "1000000000000", "10.005"] {
        let resp = admin
            .post(server.url("/api/products"))
            .json(&json!({ "title": "Emas", "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "price {price}");
    }

    // The largest storable price is accepted, but two of it do not fit a cart.
    let resp = admin
        .post(server.url("/api/products"))
        .json(&json!({ "title": "Emas", "price": "999999999999.99" }))
        .send()
        .await
        .unwrap();
    let (status, emas) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);

    let buyer = server.client();
    let add = json!({ "productId": emas["id"] });
    let resp = buyer
        .post(server.url("/api/cart/add"))
        .json(&add)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = buyer
        .post(server.url("/api/cart/add"))
        .json(&add)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let cart = get_json(&buyer, &server.url("/api/cart")).await;
    assert_eq!(cart["itemCount"], 1);
    assert_eq!(cart["total"], "999999999999.99");
}

#[tokio::test]
async fn test_admin_delete_keeps_placed_orders() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi Susu", 25_000).await;
    let teh = server.seed_product("Teh Tarik", 18_000).await;
    let path = format!("/api/products/{}", kopi.id);

    let buyer = server.client();
    server.sign_up(&buyer, "budi@example.com").await;
    server.add_to_cart(&buyer, &kopi).await;
    let resp = buyer
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    let (status, order) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);

    // Warm the catalog cache.
    get_json(&buyer, &server.url(&path)).await;
    assert_eq!(
        get_json(&buyer, &server.url("/api/products"))
            .await
            .as_array()
            .unwrap()
            .len(),
        2
    );

    let resp = buyer.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = server.client();
    server.sign_up_admin(&admin, "admin@example.com").await;
    let resp = admin.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = admin.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = buyer.get(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let products = get_json(&buyer, &server.url("/api/products")).await;
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], teh.id.as_i64());

    let resp = buyer
        .post(server.url("/api/cart/add"))
        .json(&json!({ "productId": kopi.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let kept = get_json(&buyer, &server.url(&format!("/api/orders/{}", order["id"]))).await;
    assert_eq!(kept["lineItemsSnapshot"][0]["title"], "Kopi Susu");
    assert_eq!(kept["totalPrice"], "25000");
}
