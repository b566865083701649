use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::sales_forecast::{
    ActiveModel as ForecastActiveModel, Column, Entity as SalesForecast, ForecastPeriod,
    Model as ForecastModel,
};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Repository for stored sales forecasts
#[derive(Debug, Clone)]
pub struct ForecastRepository {
    base: BaseRepository,
}

impl ForecastRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find(
        &self,
        product_id: Uuid,
        forecast_date: NaiveDate,
        period: ForecastPeriod,
    ) -> Result<Option<ForecastModel>, ServiceError> {
        SalesForecast::find()
            .filter(Column::ProductId.eq(product_id))
            .filter(Column::ForecastDate.eq(forecast_date))
            .filter(Column::Period.eq(period.to_string()))
            .one(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Insert or update the forecast for (product, date, period).
    /// Returns the stored row and whether it was newly created.
    pub async fn upsert(
        &self,
        product_id: Uuid,
        forecast_date: NaiveDate,
        period: ForecastPeriod,
        predicted_sales: Decimal,
    ) -> Result<(ForecastModel, bool), ServiceError> {
        let db = self.base.get_db();

        if let Some(existing) = self.find(product_id, forecast_date, period).await? {
            let mut active_model: ForecastActiveModel = existing.into();
            active_model.predicted_sales = Set(predicted_sales);
            let updated = active_model
                .update(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            return Ok((updated, false));
        }

        let created = ForecastActiveModel {
            product_id: Set(product_id),
            forecast_date: Set(forecast_date),
            predicted_sales: Set(predicted_sales),
            period: Set(period.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok((created, true))
    }

    /// Stored forecasts for a product, newest forecast date first
    pub async fn for_product(&self, product_id: Uuid) -> Result<Vec<ForecastModel>, ServiceError> {
        SalesForecast::find()
            .filter(Column::ProductId.eq(product_id))
            .order_by_desc(Column::ForecastDate)
            .order_by_desc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        SalesForecast::find()
            .count(self.base.get_db())
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

impl Repository for ForecastRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
