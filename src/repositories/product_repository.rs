use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::entities::price_history::{
    self, ActiveModel as PriceHistoryActiveModel, Entity as PriceHistory, Model as PriceHistoryModel,
    Platform,
};
use crate::entities::product::{
    ActiveModel as ProductActiveModel, Column, Entity as Product, Model as ProductModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for products and their price history
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
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductModel>, ServiceError> {
        Product::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_asin(&self, asin: &str) -> Result<Option<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::Asin.eq(asin))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_all(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Product::find()
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn create(&self, product: ProductActiveModel) -> Result<ProductModel, ServiceError> {
        product
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Insert or overwrite the product with this ASIN.
    ///
    /// Every field set on `fields` replaces the stored value; the id and
    /// creation stamp of an existing row are kept. Returns the stored row and
    /// whether it was newly created.
    pub async fn upsert_by_asin(
        &self,
        asin: &str,
        mut fields: ProductActiveModel,
    ) -> Result<(ProductModel, bool), ServiceError> {
        fields.asin = Set(Some(asin.to_string()));

        match self.find_by_asin(asin).await? {
            Some(existing) => {
                debug!(asin, product_id = %existing.id, "updating existing product");
                fields.id = ActiveValue::Unchanged(existing.id);
                fields.created_at = ActiveValue::NotSet;
                let updated = fields
                    .update(self.base.get_db())
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                Ok((updated, false))
            }
            None => {
                debug!(asin, "inserting new product");
                fields.id = ActiveValue::NotSet;
                let created = self.create(fields).await?;
                Ok((created, true))
            }
        }
    }

    /// Append a price observation
    pub async fn append_price(
        &self,
        product_id: Uuid,
        platform: Platform,
        price: Decimal,
    ) -> Result<PriceHistoryModel, ServiceError> {
        PriceHistoryActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            platform: Set(platform.to_string()),
            price: Set(price),
            scraped_date: Set(Utc::now()),
        }
        .insert(self.base.get_db())
        .await
        .map_err(ServiceError::DatabaseError)
    }

    /// The most recent `limit` price observations, returned oldest first
    pub async fn recent_prices(
        &self,
        product_id: Uuid,
        limit: u64,
    ) -> Result<Vec<PriceHistoryModel>, ServiceError> {
        let mut rows = PriceHistory::find()
            .filter(price_history::Column::ProductId.eq(product_id))
            .order_by_desc(price_history::Column::ScrapedDate)
            .limit(limit)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;
        rows.reverse();
        Ok(rows)
    }

    pub async fn price_history_count(&self, product_id: Uuid) -> Result<u64, ServiceError> {
        PriceHistory::find()
            .filter(price_history::Column::ProductId.eq(product_id))
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

impl Repository for ProductRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
