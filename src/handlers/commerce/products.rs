use crate::handlers::common::{
    created_response, no_content_response, success_response, PaginationParams,
};
use crate::{
    errors::ServiceError,
    services::commerce::{NewProduct, Product},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).delete(delete_product))
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Option<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductCreatedResponse {
    pub id: i64,
}

/// List products, newest first
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (offset, limit) = params.resolve(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    )?;

    let (products, count) = state
        .services
        .product_catalog
        .list_products(offset, limit)
        .await?;

    Ok(success_response(ProductListResponse { products, count }))
}

/// Create a new product
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state
        .services
        .product_catalog
        .create_product(payload)
        .await?;

    Ok(created_response(ProductCreatedResponse { id }))
}

/// Get a product by ID; an unknown ID yields `{"product": null}`
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.product_catalog.get_product(id).await?;
    Ok(success_response(ProductResponse { product }))
}

/// Delete a product
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.product_catalog.delete_product(id).await?;
    Ok(no_content_response())
}
