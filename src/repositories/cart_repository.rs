use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::cart_store::{CartId, CartStore, InsertOutcome, LineItem, LineItemId, ProductPricing};
use super::{BaseRepository, Repository};
use crate::entities::{cart, cart_item, product};
use crate::errors::ServiceError;
use crate::services::commerce::catalog::{
    attributes_to_json, variant_key, AttributeMap, VariantDefinition, VariantPricing,
};

/// `CartStore` backed by the relational schema.
#[derive(Debug)]
pub struct SeaOrmCartStore {
    base: BaseRepository,
}

impl SeaOrmCartStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn find_product(&self, product_id: i64) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(self.base.get_db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl TryFrom<cart_item::Model> for LineItem {
    type Error = ServiceError;

    fn try_from(model: cart_item::Model) -> Result<Self, Self::Error> {
        let attributes = match model.variant {
            None | Some(serde_json::Value::Null) => AttributeMap::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                ServiceError::CatalogCorrupt(format!(
                    "cart line {} has an unreadable variant: {}",
                    model.id, e
                ))
            })?,
        };

        Ok(LineItem {
            id: model.id,
            cart_id: model.cart_id,
            product_id: model.product_id,
            attributes,
            quantity: model.quantity,
            price: model.price,
            discount_percentage: model.discount_percentage,
        })
    }
}

#[async_trait]
impl CartStore for SeaOrmCartStore {
    async fn get_cart_id(&self, user_id: i64) -> Result<Option<CartId>, ServiceError> {
        let cart = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(self.base.get_db())
            .await?;
        Ok(cart.map(|c| c.id))
    }

    #[instrument(skip(self))]
    async fn create_cart(&self, user_id: i64) -> Result<CartId, ServiceError> {
        let cart_id = Uuid::new_v4();
        let model = cart::ActiveModel {
            id: Set(cart_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
        };

        match cart::Entity::insert(model)
            .exec_without_returning(self.base.get_db())
            .await
        {
            Ok(_) => Ok(cart_id),
            Err(err) if is_unique_violation(&err) => {
                debug!(user_id, "cart created concurrently; reusing existing cart");
                self.get_cart_id(user_id).await?.ok_or_else(|| {
                    ServiceError::storage_message(format!(
                        "cart for user {} conflicted on insert but cannot be read",
                        user_id
                    ))
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_variant_definitions(
        &self,
        product_id: i64,
    ) -> Result<Vec<VariantDefinition>, ServiceError> {
        let product = self.find_product(product_id).await?;
        VariantDefinition::parse_list(&product.variants)
    }

    async fn find_line_item(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
    ) -> Result<Option<LineItem>, ServiceError> {
        cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .filter(cart_item::Column::VariantKey.eq(variant_key(attributes)))
            .one(self.base.get_db())
            .await?
            .map(LineItem::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn insert_line_item(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
        pricing: Option<VariantPricing>,
    ) -> Result<InsertOutcome, ServiceError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = cart_item::ActiveModel {
            id: Set(id),
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            variant: Set((!attributes.is_empty()).then(|| attributes_to_json(attributes))),
            variant_key: Set(variant_key(attributes)),
            quantity: Set(1),
            price: Set(pricing.map(|p| p.price)),
            discount_percentage: Set(pricing.and_then(|p| p.discount_percentage)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match cart_item::Entity::insert(model)
            .exec_without_returning(self.base.get_db())
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted(id)),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Duplicate),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_line_item_quantity(
        &self,
        line_item_id: LineItemId,
        delta: i32,
    ) -> Result<i32, ServiceError> {
        // Single UPDATE so concurrent writers serialize on the row.
        let result = cart_item::Entity::update_many()
            .col_expr(
                cart_item::Column::Quantity,
                Expr::col(cart_item::Column::Quantity).add(delta),
            )
            .col_expr(cart_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart_item::Column::Id.eq(line_item_id))
            .exec(self.base.get_db())
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "cart line {} not found",
                line_item_id
            )));
        }

        cart_item::Entity::find_by_id(line_item_id)
            .one(self.base.get_db())
            .await?
            .map(|line| line.quantity)
            .ok_or_else(|| ServiceError::NotFound(format!("cart line {} not found", line_item_id)))
    }

    async fn delete_line_item(&self, line_item_id: LineItemId) -> Result<(), ServiceError> {
        cart_item::Entity::delete_by_id(line_item_id)
            .exec(self.base.get_db())
            .await?;
        Ok(())
    }

    async fn list_line_items(&self, cart_id: CartId) -> Result<Vec<LineItem>, ServiceError> {
        cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(self.base.get_db())
            .await?
            .into_iter()
            .map(LineItem::try_from)
            .collect()
    }

    async fn get_base_product_pricing(
        &self,
        product_id: i64,
    ) -> Result<ProductPricing, ServiceError> {
        let product = self.find_product(product_id).await?;
        Ok(ProductPricing {
            name: product.name,
            price: product.price,
            discount_percentage: product.discount_percentage,
        })
    }

    #[instrument(skip(self))]
    async fn delete_cart(&self, cart_id: CartId) -> Result<bool, ServiceError> {
        let result = cart::Entity::delete_by_id(cart_id)
            .exec(self.base.get_db())
            .await?;
        Ok(result.rows_affected > 0)
    }
}
