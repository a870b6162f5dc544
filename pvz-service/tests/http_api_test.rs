//! HTTP API tests through the router with `tower::ServiceExt::oneshot`.

mod common;

use axum::http::{Method, StatusCode};
use common::{employee_token, memory_router, moderator_token, send};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_pvz(router: &axum::Router, moderator: &str, city: &str) -> Value {
    let (status, body) = send(
        router,
        Method::POST,
        "/pvz",
        Some(moderator),
        Some(json!({ "city": city })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create pvz failed: {}", body);
    body
}

#[tokio::test]
async fn dummy_login_issues_token_for_known_roles() {
    let (router, _state) = memory_router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/dummyLogin",
        None,
        Some(json!({ "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, _) = send(
        &router,
        Method::POST,
        "/dummyLogin",
        None,
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_then_login() {
    let (router, _state) = memory_router();

    let (status, user) = send(
        &router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "clerk@example.com", "password": "secret123", "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "clerk@example.com");
    assert_eq!(user["role"], "employee");
    assert!(user.get("password_hash").is_none());

    let (status, _) = send(
        &router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "clerk@example.com", "password": "another1", "role": "moderator" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "clerk@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&router, Method::GET, "/pvz", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "clerk@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_validates_input() {
    let (router, _state) = memory_router();

    let (status, body) = send(
        &router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "secret123", "role": "employee" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (router, _state) = memory_router();

    let (status, _) = send(&router, Method::GET, "/pvz", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, Method::GET, "/pvz", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_are_enforced() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    let (status, _) = send(
        &router,
        Method::POST,
        "/pvz",
        Some(&employee),
        Some(json!({ "city": "Moscow" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let pvz = create_pvz(&router, &moderator, "Moscow").await;
    let pvz_id = pvz["id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&moderator),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        Method::POST,
        &format!("/pvz/{}/delete_last_product", pvz_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reception_flow_over_http() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    let pvz = create_pvz(&router, &moderator, "Saint Petersburg").await;
    assert_eq!(pvz["city"], "Saint Petersburg");
    let pvz_id = pvz["id"].as_str().unwrap().to_string();

    let (status, reception) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reception["status"], "in_progress");
    assert_eq!(reception["pvzId"], pvz_id.as_str());
    let reception_id = reception["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for category in ["electronics", "clothes", "footwear"] {
        let (status, item) = send(
            &router,
            Method::POST,
            "/products",
            Some(&employee),
            Some(json!({ "type": category, "pvzId": pvz_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["type"], category);
        assert_eq!(item["receptionId"], reception_id.as_str());
    }

    let (status, body) = send(
        &router,
        Method::POST,
        &format!("/pvz/{}/delete_last_product", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product successfully deleted");

    let (status, closed) = send(
        &router,
        Method::POST,
        &format!("/pvz/{}/close_last_reception", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "close");

    let (status, details) = send(
        &router,
        Method::GET,
        &format!("/receptions/{}", reception_id),
        Some(&moderator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["id"], reception_id.as_str());
    let products = details["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[1]["sequenceNum"], 2);

    let (status, _) = send(
        &router,
        Method::POST,
        &format!("/pvz/{}/close_last_reception", pvz_id),
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    let (status, _) = send(
        &router,
        Method::POST,
        "/pvz",
        Some(&moderator),
        Some(json!({ "city": "Novosibirsk" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let pvz = create_pvz(&router, &moderator, "Kazan").await;
    let pvz_id = pvz["id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        Method::POST,
        "/products",
        Some(&employee),
        Some(json!({ "type": "electronics", "pvzId": pvz_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "no open reception");

    let (status, _) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::GET,
        "/pvz?startDate=yesterday&endDate=today",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_paginated_and_limit_is_clamped() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    for _ in 0..3 {
        create_pvz(&router, &moderator, "Moscow").await;
    }

    let (status, body) = send(&router, Method::GET, "/pvz?page=2&limit=2", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pageCount"], 2);

    let (_, body) = send(&router, Method::GET, "/pvz?limit=500", Some(&employee), None).await;
    assert_eq!(body["pagination"]["limit"], 30);

    let (_, body) = send(&router, Method::GET, "/pvz?page=abc&limit=-1", Some(&employee), None).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn date_filter_over_http() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    let pvz = create_pvz(&router, &moderator, "Moscow").await;
    create_pvz(&router, &moderator, "Kazan").await;
    send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz["id"] })),
    )
    .await;

    let (status, body) = send(
        &router,
        Method::GET,
        "/pvz?startDate=2000-01-01T00:00:00Z&endDate=2999-01-01T00:00:00Z",
        Some(&employee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["pvz"]["id"], pvz["id"]);
    assert_eq!(data[0]["receptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reception_products_are_paginated() {
    let (router, state) = memory_router();
    let employee = employee_token(&state);
    let moderator = moderator_token(&state);

    let pvz = create_pvz(&router, &moderator, "Kazan").await;
    let (_, reception) = send(
        &router,
        Method::POST,
        "/receptions",
        Some(&employee),
        Some(json!({ "pvzId": pvz["id"] })),
    )
    .await;
    for _ in 0..5 {
        send(
            &router,
            Method::POST,
            "/products",
            Some(&employee),
            Some(json!({ "type": "footwear", "pvzId": pvz["id"] })),
        )
        .await;
    }

    let uri = format!(
        "/receptions/{}/products?page=2&limit=2",
        reception["id"].as_str().unwrap()
    );
    let (status, body) = send(&router, Method::GET, &uri, Some(&moderator), None).await;
    assert_eq!(status, StatusCode::OK);
    let sequences: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["sequenceNum"].as_i64().unwrap())
        .collect();
    assert_eq!(sequences, vec![3, 4]);
    assert_eq!(body["pagination"]["total"], 5);

    let missing = format!("/receptions/{}/products", Uuid::new_v4());
    let (status, _) = send(&router, Method::GET, &missing, Some(&moderator), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let (router, _state) = memory_router();

    let (status, body) = send(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");

    let (status, _) = send(&router, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
