//! Product reviews over HTTP.

use reqwest::StatusCode;
use serde_json::json;
use tokoku_integration_tests::{TestServer, get_json, status_and_json};

#[tokio::test]
async fn test_reviews_average_and_order() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi Susu", 25_000).await;
    let path = server.url(&format!("/api/products/{}/reviews", kopi.id));
    let client = server.client();

    let empty = get_json(&client, &path).await;
    assert_eq!(empty["averageRating"], 0.0);
    assert_eq!(empty["reviewCount"], 0);
    assert!(empty["reviews"].as_array().unwrap().is_empty());

    server.sign_up(&client, "budi@example.com").await;
    for (rating, comment) in [(5, "Mantap"), (4, "Enak"), (4, "  Lumayan  ")] {
        let resp = client
            .post(path.clone())
            .json(&json!({ "rating": rating, "comment": comment }))
            .send()
            .await
            .unwrap();
        let (status, review) = status_and_json(resp).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review["author"], "budi@example.com");
    }

    let summary = get_json(&client, &path).await;
    assert_eq!(summary["reviewCount"], 3);
    assert_eq!(summary["averageRating"], 4.3);
    let reviews = summary["reviews"].as_array().unwrap();
    assert_eq!(reviews[0]["comment"], "Lumayan");
    assert_eq!(reviews[2]["comment"], "Mantap");
}

#[tokio::test]
async fn test_posting_a_review_needs_sign_in_and_valid_input() {
    let server = TestServer::start().await;
    let kopi = server.seed_product("Kopi Susu", 25_000).await;
    let path = server.url(&format!("/api/products/{}/reviews", kopi.id));
    let client = server.client();

    let resp = client
        .post(path.clone())
        .json(&json!({ "rating": 5, "comment": "Mantap" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    server.sign_up(&client, "budi@example.com").await;
    for body in [
        json!({ "rating": 0, "comment": "Buruk" }),
        json!({ "rating": 6, "comment": "Hebat" }),
        json!({ "rating": 3, "comment": "   " }),
    ] {
        let resp = client.post(path.clone()).json(&body).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let resp = client
        .post(server.url("/api/products/999/reviews"))
        .json(&json!({ "rating": 5, "comment": "Mantap" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(server.url("/api/products/999/reviews"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(get_json(&client, &path).await["reviewCount"], 0);
}
