mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::{json, Map, Value};
use storefront_cart::{errors::ServiceError, events::Event, services::commerce::NewProduct};

fn variant(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

#[tokio::test]
async fn create_then_get_product() {
    let app = TestApp::new().await;
    let catalog = app.state.services.product_catalog.clone();

    let id = catalog
        .create_product(NewProduct {
            name: "Tee".to_string(),
            description: "Cotton tee".to_string(),
            variants: vec![
                variant(json!({"color": "red", "price": 15})),
                variant(json!({"color": "blue", "price": 18, "discountPercentage": 10})),
            ],
            ..Default::default()
        })
        .await
        .unwrap();

    let product = catalog.get_product(id).await.unwrap().unwrap();
    assert_eq!(product.name, "Tee");
    assert_eq!(product.price, None);
    assert_eq!(product.variants.len(), 2);
    assert_eq!(product.variants[1]["color"], "blue");

    assert_eq!(app.drain_events().await, vec![Event::ProductCreated(id)]);
}

#[tokio::test]
async fn unknown_product_reads_as_none() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.product_catalog;
    assert!(catalog.get_product(12345).await.unwrap().is_none());

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/products/12345", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"product": null}));
}

#[tokio::test]
async fn duplicate_variant_mappings_are_rejected() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .product_catalog
        .create_product(NewProduct {
            name: "Hoodie".to_string(),
            description: "Warm".to_string(),
            variants: vec![
                variant(json!({"color": "red", "size": "M", "price": 10})),
                variant(json!({"size": "M", "color": "red", "price": 12})),
            ],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidRequest(_));
}

#[tokio::test]
async fn product_needs_price_or_variants() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .product_catalog
        .create_product(NewProduct {
            name: "Ghost".to_string(),
            description: "Nothing to sell".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidRequest(_));
}

#[tokio::test]
async fn create_and_list_over_http() {
    let app = TestApp::new().await;

    for name in ["Mug", "Plate", "Bowl"] {
        let (status, body) = app
            .request_json(
                Method::POST,
                "/api/v1/products",
                Some(json!({"name": name, "description": "Stoneware", "price": "12.5"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_i64());
    }

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/products?limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["products"].as_array().unwrap().len(), 2);
    assert_eq!(body["products"][0]["name"], "Bowl");

    let (status, _) = app
        .request_json(Method::GET, "/api/v1/products?limit=0", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_product_payload_is_bad_request() {
    let app = TestApp::new().await;
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Tee",
                "description": "Cotton",
                "variants": [{"color": 3, "price": 10}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/products",
            Some(json!({"name": "Mug", "description": "Cup", "price": 5, "discountPercentage": 150})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_product_over_http() {
    let app = TestApp::new().await;
    let id = app.seed_product("Mug", Some(dec!(20)), None, json!([])).await;

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/products/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.drain_events().await, vec![Event::ProductDeleted(id)]);
}
