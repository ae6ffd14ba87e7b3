//! Order visibility and status changes over HTTP.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokoku_integration_tests::{TestServer, get_json, status_and_json};

/// Sign `client` up as `email`, buy one product and return the order.
async fn place_order(server: &TestServer, client: &Client, email: &str) -> Value {
    let product = server.seed_product("Kopi", 10_000).await;
    server.sign_up(client, email).await;
    server.add_to_cart(client, &product).await;

    let resp = client
        .post(server.url("/api/cart/checkout"))
        .send()
        .await
        .unwrap();
    let (status, order) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    order
}

async fn put_status(server: &TestServer, client: &Client, id: &Value, status: &str) -> reqwest::Response {
    client
        .put(server.url(&format!("/api/orders/{id}/status")))
        .json(&json!({ "newStatus": status }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_orders_require_sign_in() {
    let server = TestServer::start().await;
    let resp = server
        .client()
        .get(server.url("/api/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_sees_only_own_orders_and_admin_sees_all() {
    let server = TestServer::start().await;
    let budi = server.client();
    let sari = server.client();
    let budi_order = place_order(&server, &budi, "budi@example.com").await;
    let sari_order = place_order(&server, &sari, "sari@example.com").await;

    let mine = get_json(&budi, &server.url("/api/orders")).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"], budi_order["id"]);

    // Someone else's order looks exactly like a missing one.
    let resp = budi
        .get(server.url(&format!("/api/orders/{}", sari_order["id"])))
        .send()
        .await
        .unwrap();
    let (status, body) = status_and_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "order not found");

    let admin = server.client();
    server.sign_up_admin(&admin, "admin@example.com").await;
    let all = get_json(&admin, &server.url("/api/orders")).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    // Newest first.
    assert_eq!(all[0]["id"], sari_order["id"]);
    assert_eq!(all[1]["id"], budi_order["id"]);

    let detail = get_json(&admin, &server.url(&format!("/api/orders/{}", budi_order["id"]))).await;
    assert_eq!(detail["ownerIdentity"], "budi@example.com");
}

#[tokio::test]
async fn test_owner_cancels_and_terminal_state_sticks() {
    let server = TestServer::start().await;
    let client = server.client();
    let order = place_order(&server, &client, "budi@example.com").await;

    let (status, body) = status_and_json(put_status(&server, &client, &order["id"], "cancelled").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "cancelled");
    assert_eq!(body["message"], "order status updated to cancelled");
    assert_eq!(body["unchanged"], false);

    let resp = put_status(&server, &client, &order["id"], "pending_payment").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(server.url(&format!("/api/orders/{}/confirm", order["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_owner_cannot_self_complete_but_can_confirm_payment() {
    let server = TestServer::start().await;
    let client = server.client();
    let order = place_order(&server, &client, "budi@example.com").await;

    let resp = put_status(&server, &client, &order["id"], "completed").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let confirm = server.url(&format!("/api/orders/{}/confirm", order["id"]));
    let (status, body) = status_and_json(client.post(&confirm).send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "completed");
    assert_eq!(body["unchanged"], false);

    // Confirming twice is harmless.
    let (status, body) = status_and_json(client.post(&confirm).send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unchanged"], true);
    assert_eq!(body["message"], "order is already completed");
}

#[tokio::test]
async fn test_admin_completes_any_order() {
    let server = TestServer::start().await;
    let customer = server.client();
    let order = place_order(&server, &customer, "budi@example.com").await;

    let admin = server.client();
    server.sign_up_admin(&admin, "admin@example.com").await;

    let (status, body) = status_and_json(put_status(&server, &admin, &order["id"], "completed").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "completed");
    // The snapshot is untouched by status changes.
    assert_eq!(body["order"]["totalPrice"], order["totalPrice"]);
    assert_eq!(body["order"]["lineItemsSnapshot"], order["lineItemsSnapshot"]);
}

#[tokio::test]
async fn test_status_labels() {
    let server = TestServer::start().await;
    let client = server.client();
    let order = place_order(&server, &client, "budi@example.com").await;

    let resp = put_status(&server, &client, &order["id"], "shipped").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Display labels from older clients are still understood.
    let (status, body) = status_and_json(put_status(&server, &client, &order["id"], "Dibatalkan").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "cancelled");
}

#[tokio::test]
async fn test_status_change_on_unknown_order_is_404() {
    let server = TestServer::start().await;
    let client = server.client();
    server.sign_up(&client, "budi@example.com").await;

    let resp = put_status(&server, &client, &json!(4242), "cancelled").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
