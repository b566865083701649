use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::churn_prediction::{
    self, ActiveModel as ChurnPredictionActiveModel, Entity as ChurnPrediction,
    Model as ChurnPredictionModel,
};
use crate::entities::customer::{
    ActiveModel as CustomerActiveModel, Column, Entity as Customer, Model as CustomerModel,
};
use crate::entities::customer_segment::{
    ActiveModel as SegmentActiveModel, Model as SegmentModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for customers, their segments and churn predictions
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find a customer by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerModel>, ServiceError> {
        Customer::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<CustomerModel>, ServiceError> {
        Customer::find()
            .filter(Column::Email.eq(email))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All customers, oldest registration first
    pub async fn find_all(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Customer::find()
            .order_by_asc(Column::RegistrationDate)
            .order_by_asc(Column::Email)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Customer::find()
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Insert a customer; the spending factor is drawn on insert when not supplied
    pub async fn create(&self, customer: CustomerActiveModel) -> Result<CustomerModel, ServiceError> {
        customer
            .insert(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Persist changes to an existing customer
    pub async fn update(&self, customer: CustomerActiveModel) -> Result<CustomerModel, ServiceError> {
        customer
            .update(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Overwrite the stored churn score
    pub async fn update_churn_score(
        &self,
        customer: CustomerModel,
        score: Decimal,
    ) -> Result<CustomerModel, ServiceError> {
        let mut active_model: CustomerActiveModel = customer.into();
        active_model.churn_score = Set(Some(score));
        self.update(active_model).await
    }

    /// Append a model-based prediction for a customer
    pub async fn record_prediction(
        &self,
        customer_id: Uuid,
        probability: f64,
    ) -> Result<ChurnPredictionModel, ServiceError> {
        ChurnPredictionActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            churn_probability: Set(probability),
            prediction_date: Set(Utc::now()),
        }
        .insert(self.base.get_db())
        .await
        .map_err(ServiceError::DatabaseError)
    }

    /// Prediction history for a customer, newest first
    pub async fn predictions_for(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ChurnPredictionModel>, ServiceError> {
        ChurnPrediction::find()
            .filter(churn_prediction::Column::CustomerId.eq(customer_id))
            .order_by_desc(churn_prediction::Column::PredictionDate)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn create_segment(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<SegmentModel, ServiceError> {
        SegmentActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.map(str::to_string)),
        }
        .insert(self.base.get_db())
        .await
        .map_err(ServiceError::DatabaseError)
    }
}

impl Repository for CustomerRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
