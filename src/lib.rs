//! Storefront cart library
//!
//! Variant-aware shopping carts over a relational product catalog: variant
//! resolution, cart line mutation with upsert/delete collapse, priced cart
//! reads and the HTTP surface in front of them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Builds the state and its services over an established pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Versioned API routes, mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", handlers::commerce::carts_routes())
        .nest("/products", handlers::commerce::products_routes())
        .nest("/health", handlers::health::health_routes())
}

/// Full application router with the HTTP middleware stack applied.
///
/// Outermost first: request id, tracing, CORS, then the per-request timeout
/// that bounds every storage call made while handling the request.
pub fn build_app(state: AppState) -> Router {
    let cors = if state.config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    middleware_helpers::request_id_middleware,
                ))
                .layer(crate::tracing::configure_http_tracing())
                .layer(cors)
                .layer(TimeoutLayer::new(state.config.request_timeout())),
        )
        .with_state(state)
}
