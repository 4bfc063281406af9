use super::catalog::AttributeMap;
use crate::errors::ServiceError;
use crate::repositories::{CartId, CartStore, LineItem, LineItemId, ProductPricing};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Priced, display-ready cart contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: CartId,
    pub products: Vec<CartProductView>,
    pub subtotal: Decimal,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find_product(&self, product_id: i64) -> impl Iterator<Item = &CartProductView> {
        self.products
            .iter()
            .filter(move |entry| entry.product_id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductView {
    pub line_item_id: LineItemId,
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<AttributeMap>,
    pub price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

/// `price * (1 - discount / 100) * quantity`, rounded to cents. `None` when
/// the result does not fit in a `Decimal`.
pub fn line_total(price: Decimal, discount: Option<Decimal>, quantity: i32) -> Option<Decimal> {
    let discount = discount.unwrap_or(Decimal::ZERO);
    let unit = price
        .checked_mul(Decimal::ONE_HUNDRED - discount)?
        .checked_div(Decimal::ONE_HUNDRED)?;
    Some(unit.checked_mul(Decimal::from(quantity))?.round_dp(2))
}

/// Prices one line.
///
/// Variant lines keep the price stamped when they were first added. Lines
/// without a variant follow the product's current base price, so base price
/// edits show up on the next read while variant lines do not move.
pub fn price_line(
    line: &LineItem,
    product: &ProductPricing,
) -> Result<CartProductView, ServiceError> {
    let (price, discount_percentage) = if line.is_variant_line() {
        (line.price, line.discount_percentage)
    } else {
        (product.price, product.discount_percentage)
    };

    let line_total = match price {
        None => None,
        Some(p) => Some(line_total(p, discount_percentage, line.quantity).ok_or_else(|| {
            ServiceError::CatalogCorrupt(format!(
                "cart line {} total overflows at price {} x {}",
                line.id, p, line.quantity
            ))
        })?),
    };

    Ok(CartProductView {
        line_item_id: line.id,
        product_id: line.product_id,
        name: product.name.clone(),
        quantity: line.quantity,
        variant: line
            .is_variant_line()
            .then(|| line.attributes.clone()),
        price,
        discount_percentage,
        line_total,
    })
}

#[derive(Clone)]
pub struct CartAssembler {
    store: Arc<dyn CartStore>,
}

impl CartAssembler {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Loads and prices every line of a cart. Entry order is unspecified.
    #[instrument(skip(self))]
    pub async fn assemble(&self, cart_id: CartId) -> Result<CartView, ServiceError> {
        let lines = self.store.list_line_items(cart_id).await?;

        let mut products: HashMap<i64, ProductPricing> = HashMap::new();
        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            if !products.contains_key(&line.product_id) {
                let pricing = self.store.get_base_product_pricing(line.product_id).await?;
                products.insert(line.product_id, pricing);
            }
            if let Some(product) = products.get(&line.product_id) {
                entries.push(price_line(line, product)?);
            }
        }

        let subtotal = entries
            .iter()
            .filter_map(|e| e.line_total)
            .try_fold(Decimal::ZERO, |acc, total| acc.checked_add(total))
            .ok_or_else(|| {
                ServiceError::CatalogCorrupt(format!("cart {} subtotal overflows", cart_id))
            })?;

        Ok(CartView {
            cart_id,
            products: entries,
            subtotal,
        })
    }
}
