use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::review::{
    ActiveModel as ReviewActiveModel, Column, Entity as Review, Model as ReviewModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

#[derive(Debug, Clone)]
pub struct ReviewRepository {
    base: BaseRepository,
}

impl ReviewRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, review: ReviewActiveModel) -> Result<ReviewModel, ServiceError> {
        review
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewModel>, ServiceError> {
        Review::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Reviews that have not been scored yet, oldest first
    pub async fn find_unscored(&self) -> Result<Vec<ReviewModel>, ServiceError> {
        Review::find()
            .filter(Column::SentimentScore.is_null())
            .order_by_asc(Column::ReviewDate)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn set_sentiment(
        &self,
        review: ReviewModel,
        score: Decimal,
    ) -> Result<ReviewModel, ServiceError> {
        let mut active_model: ReviewActiveModel = review.into();
        active_model.sentiment_score = Set(Some(score));
        active_model
            .update(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

impl Repository for ReviewRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
