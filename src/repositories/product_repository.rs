use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
};
use std::sync::Arc;

use crate::entities::product::{
    ActiveModel as ProductActiveModel, Column, Entity as Product, Model as ProductModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for catalog products
#[derive(Debug, Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a product by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductModel>, ServiceError> {
        Ok(Product::find_by_id(id).one(self.base.get_db()).await?)
    }

    /// Get a window of products, newest first, with the total product count
    pub async fn find_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ProductModel>, u64), ServiceError> {
        let total = Product::find().count(self.base.get_db()).await?;

        let products = Product::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.base.get_db())
            .await?;

        Ok((products, total))
    }

    /// Insert a product and return the stored row
    pub async fn create(&self, product: ProductActiveModel) -> Result<ProductModel, ServiceError> {
        Ok(product.insert(self.base.get_db()).await?)
    }

    /// Delete a product by ID, returning whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let result = Product::delete_by_id(id).exec(self.base.get_db()).await?;
        Ok(result.rows_affected > 0)
    }
}
