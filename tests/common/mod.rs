#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use storefront_cart::{
    config::AppConfig,
    db,
    entities::product,
    events::{Event, EventSender},
    repositories::{CartStore, SeaOrmCartStore},
    services::commerce::CartService,
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    events: tokio::sync::Mutex<mpsc::Receiver<Event>>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // Each sqlite::memory: connection is its own database; pin the pool to one.
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let router = storefront_cart::build_app(state.clone());

        Self {
            router,
            state,
            events: tokio::sync::Mutex::new(event_rx),
        }
    }

    pub fn cart_service(&self) -> Arc<CartService> {
        self.state.services.cart.clone()
    }

    /// A raw store over the same pool, for reaching past the services.
    pub fn store(&self) -> Arc<dyn CartStore> {
        Arc::new(SeaOrmCartStore::new(self.state.db.clone()))
    }

    /// Events emitted so far, in order.
    pub async fn drain_events(&self) -> Vec<Event> {
        let mut rx = self.events.lock().await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Inserts a product row directly, bypassing catalog validation.
    pub async fn seed_product(
        &self,
        name: &str,
        price: Option<Decimal>,
        discount_percentage: Option<Decimal>,
        variants: Value,
    ) -> i64 {
        let now = Utc::now();
        let model = product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("{} description", name)),
            price: Set(price),
            discount_percentage: Set(discount_percentage),
            variants: Set(variants),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        model
            .insert(&*self.state.db)
            .await
            .expect("failed to seed product")
            .id
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not JSON")
        };
        (status, json)
    }
}
