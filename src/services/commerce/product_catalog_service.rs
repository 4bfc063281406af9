use super::catalog::{
    decimal_from_json, is_pricing_key, variant_key, AttributeMap, VariantDefinition, DISCOUNT_KEY,
    PRICE_KEY,
};
use crate::{
    entities::product,
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::ProductRepository,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Input for [`ProductCatalogService::create_product`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub variants: Vec<Map<String, Value>>,
}

/// A catalog product as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub variants: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<product::Model> for Product {
    type Error = ServiceError;

    fn try_from(model: product::Model) -> Result<Self, Self::Error> {
        let variants = VariantDefinition::parse_list(&model.variants)?
            .into_iter()
            .map(VariantDefinition::into_json)
            .collect();
        Ok(Product {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            discount_percentage: model.discount_percentage,
            variants,
            created_at: model.created_at,
        })
    }
}

fn invalid(message: impl Into<String>) -> ServiceError {
    ServiceError::InvalidRequest(message.into())
}

/// Upper bound for any catalog price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn check_price(price: Decimal, field: &str) -> Result<(), ServiceError> {
    if price < Decimal::ZERO {
        return Err(invalid(format!("{} must not be negative", field)));
    }
    if price > MAX_PRICE {
        return Err(invalid(format!("{} must not exceed {}", field, MAX_PRICE)));
    }
    Ok(())
}

fn check_discount(discount: Decimal, field: &str) -> Result<(), ServiceError> {
    if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
        return Err(invalid(format!("{} must be between 0 and 100", field)));
    }
    Ok(())
}

fn check_variant(index: usize, variant: &Map<String, Value>) -> Result<String, ServiceError> {
    let price = match variant.get(PRICE_KEY) {
        None => return Err(invalid(format!("variant #{} must have a price", index))),
        Some(value) => decimal_from_json(value)
            .ok_or_else(|| invalid(format!("variant #{}: price must be a number", index)))?,
    };
    check_price(price, &format!("variant #{}: price", index))?;

    if let Some(value) = variant.get(DISCOUNT_KEY) {
        let discount = decimal_from_json(value).ok_or_else(|| {
            invalid(format!("variant #{}: discountPercentage must be a number", index))
        })?;
        check_discount(discount, &format!("variant #{}: discountPercentage", index))?;
    }

    let mut attributes = AttributeMap::new();
    for (key, value) in variant.iter().filter(|(key, _)| !is_pricing_key(key)) {
        let Some(text) = value.as_str() else {
            return Err(invalid(format!(
                "variant #{}: value of `{}` must be a string",
                index, key
            )));
        };
        attributes.insert(key.clone(), text.to_string());
    }
    if attributes.is_empty() {
        return Err(invalid(format!(
            "variant #{} must have at least one attribute",
            index
        )));
    }

    Ok(variant_key(&attributes))
}

/// Checks everything a product needs before it can back cart lines.
pub fn validate_new_product(input: &NewProduct) -> Result<(), ServiceError> {
    input.validate()?;

    if input.price.is_none() && input.variants.is_empty() {
        return Err(invalid("price or variants is required"));
    }
    if let Some(price) = input.price {
        check_price(price, "price")?;
    }
    if let Some(discount) = input.discount_percentage {
        check_discount(discount, "discountPercentage")?;
    }

    let mut seen = HashSet::new();
    for (index, variant) in input.variants.iter().enumerate() {
        let key = check_variant(index, variant)?;
        if !seen.insert(key) {
            return Err(invalid(format!(
                "variant #{} duplicates the attributes of an earlier variant",
                index
            )));
        }
    }

    Ok(())
}

/// Product catalog service for managing products and their variant catalogs
#[derive(Clone)]
pub struct ProductCatalogService {
    products: ProductRepository,
    event_sender: Arc<EventSender>,
}

impl ProductCatalogService {
    pub fn new(products: ProductRepository, event_sender: Arc<EventSender>) -> Self {
        Self {
            products,
            event_sender,
        }
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<i64, ServiceError> {
        validate_new_product(&input)?;

        let now = Utc::now();
        let variants = Value::Array(input.variants.into_iter().map(Value::Object).collect());
        let model = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            discount_percentage: Set(input.discount_percentage),
            variants: Set(variants),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let product = self.products.create(model).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!("Created product: {}", product.id);
        Ok(product.id)
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i64) -> Result<Option<Product>, ServiceError> {
        self.products
            .find_by_id(product_id)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// List products, newest first, with the total count
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Product>, u64), ServiceError> {
        let (models, total) = self.products.find_page(offset, limit).await?;
        let products = models
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((products, total))
    }

    /// Delete a product. Cart lines referencing it are removed with it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i64) -> Result<(), ServiceError> {
        if !self.products.delete(product_id).await? {
            return Err(ServiceError::NotFound(format!(
                "product {} not found",
                product_id
            )));
        }

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }
}
