use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::order::{
    self, ActiveModel as OrderActiveModel, Entity as Order, Model as OrderModel,
};
use crate::entities::order_item::{
    self, ActiveModel as OrderItemActiveModel, Entity as OrderItem, Model as OrderItemModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for order operations
#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a new order
    pub async fn create(&self, order: OrderActiveModel) -> Result<OrderModel, ServiceError> {
        order
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Add a line to an order. The order total is left as stored.
    pub async fn add_item(&self, item: OrderItemActiveModel) -> Result<OrderItemModel, ServiceError> {
        item.insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Distinct products appearing in any of the customer's orders
    pub async fn purchased_product_ids(&self, customer_id: Uuid) -> Result<HashSet<Uuid>, ServiceError> {
        let product_ids: Vec<Uuid> = OrderItem::find()
            .inner_join(Order)
            .filter(order::Column::CustomerId.eq(customer_id))
            .select_only()
            .column(order_item::Column::ProductId)
            .into_tuple()
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(product_ids.into_iter().collect())
    }
}

impl Repository for OrderRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
