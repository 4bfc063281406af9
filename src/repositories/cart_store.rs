//! Storage boundary of the cart engine.

use crate::errors::ServiceError;
use crate::services::commerce::catalog::{AttributeMap, VariantDefinition, VariantPricing};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub type CartId = Uuid;
pub type LineItemId = Uuid;

/// A stored cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub cart_id: CartId,
    pub product_id: i64,
    /// Empty for non-variant lines.
    pub attributes: AttributeMap,
    pub quantity: i32,
    /// Stamped at first add; always `None` on non-variant lines.
    pub price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

impl LineItem {
    pub fn is_variant_line(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Result of inserting a line under the `(cart, product, attributes)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(LineItemId),
    /// A concurrent writer created the same line first.
    Duplicate,
}

/// Live base data of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPricing {
    pub name: String,
    pub price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

/// Every storage operation the cart engine performs.
///
/// Each call is its own unit of work; implementations hold no transaction
/// across calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart_id(&self, user_id: i64) -> Result<Option<CartId>, ServiceError>;

    /// Creates the user's cart, returning the existing one if another request
    /// created it first.
    async fn create_cart(&self, user_id: i64) -> Result<CartId, ServiceError>;

    /// `NotFound` when the product does not exist.
    async fn get_variant_definitions(
        &self,
        product_id: i64,
    ) -> Result<Vec<VariantDefinition>, ServiceError>;

    async fn find_line_item(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
    ) -> Result<Option<LineItem>, ServiceError>;

    /// Inserts a line with quantity 1.
    async fn insert_line_item(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
        pricing: Option<VariantPricing>,
    ) -> Result<InsertOutcome, ServiceError>;

    /// Adds `delta` to the quantity and returns the new value. `NotFound` when
    /// the row is gone.
    async fn update_line_item_quantity(
        &self,
        line_item_id: LineItemId,
        delta: i32,
    ) -> Result<i32, ServiceError>;

    /// Succeeds whether or not the row still exists.
    async fn delete_line_item(&self, line_item_id: LineItemId) -> Result<(), ServiceError>;

    async fn list_line_items(&self, cart_id: CartId) -> Result<Vec<LineItem>, ServiceError>;

    /// `NotFound` when the product does not exist.
    async fn get_base_product_pricing(
        &self,
        product_id: i64,
    ) -> Result<ProductPricing, ServiceError>;

    /// Deletes the cart and, through the schema, its lines. Returns whether a
    /// row was removed.
    async fn delete_cart(&self, cart_id: CartId) -> Result<bool, ServiceError>;
}
