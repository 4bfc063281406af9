use crate::handlers::common::{created_response, success_response, validate_input};
use crate::{
    errors::ServiceError,
    services::commerce::{AttributeMap, CartAction, CartUpdate},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

/// Creates the router for cart endpoints, nested under `/users`
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id/cart", get(fetch_cart).post(update_cart))
        .route("/:user_id/cart/order", post(place_order))
}

/// Get the user's cart, creating it on first access
async fn fetch_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.cart.fetch_cart(user_id).await?;
    Ok(success_response(cart))
}

/// Add one unit of a product to the cart, or remove one
async fn update_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateCartRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .cart
        .update_cart(user_id, payload.into())
        .await?;

    Ok(created_response(outcome))
}

/// Place the order: returns the final cart contents and deletes the cart
async fn place_order(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.cart.checkout(user_id).await?;
    Ok(success_response(order))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    #[serde(rename = "type")]
    pub action: CartAction,
    #[validate(range(min = 1, message = "productId must be at least 1"))]
    pub product_id: i64,
    #[serde(default)]
    pub variant: Option<AttributeMap>,
}

impl From<UpdateCartRequest> for CartUpdate {
    fn from(request: UpdateCartRequest) -> Self {
        CartUpdate {
            action: request.action,
            product_id: request.product_id,
            attributes: request.variant.unwrap_or_default(),
        }
    }
}
