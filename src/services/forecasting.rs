use chrono::NaiveDate;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::ForecastConfig;
use crate::entities::product;
use crate::entities::sales_forecast::{self, ForecastPeriod};
use crate::errors::ServiceError;
use crate::ml::{RegressionMetrics, SentimentAnalyzer};
use crate::repositories::{ForecastRepository, ProductRepository};

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Base sales from free text such as `"2K+ bought in past month"`.
///
/// Takes the first run of digits. If the upper-cased text contains `K` the
/// number is multiplied by 1,000; otherwise if it contains `M`, by 1,000,000.
/// The letter may appear anywhere in the text. No digits yields 0; overflow
/// saturates.
pub fn parse_base_sales(sales_volume: Option<&str>) -> u64 {
    let Some(text) = sales_volume else {
        return 0;
    };
    let Some(digits) = FIRST_NUMBER.find(text) else {
        return 0;
    };

    // A digit run too long for u64 saturates
    let base = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
    let upper = text.to_uppercase();
    if upper.contains('K') {
        base.saturating_mul(1_000)
    } else if upper.contains('M') {
        base.saturating_mul(1_000_000)
    } else {
        base
    }
}

/// Largest value the `predicted_sales` column holds (12 digits, 2 after the point)
pub fn max_stored_forecast() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Round a forecast to cents and cap it at [`max_stored_forecast`].
/// Returns the stored value and whether it was capped.
pub fn storable_forecast(forecasted_sales: f64) -> (Decimal, bool) {
    let ceiling = max_stored_forecast();
    match Decimal::from_f64(forecasted_sales) {
        Some(value) if value.round_dp(2) <= ceiling => (value.round_dp(2).max(Decimal::ZERO), false),
        _ => (ceiling, true),
    }
}

/// Forecast inputs and result for one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForecast {
    pub product_id: Uuid,
    pub base_sales: u64,
    pub sentiment_polarity: f64,
    pub forecasted_sales: f64,
}

/// `base_sales * (1 + polarity * sentiment_weight)`
pub fn forecast_sales_for_product(
    product: &product::Model,
    analyzer: &SentimentAnalyzer,
    sentiment_weight: f64,
) -> ProductForecast {
    let base_sales = parse_base_sales(product.sales_volume.as_deref());
    let sentiment_polarity = analyzer.polarity_of(product.customers_say.as_deref());
    let forecasted_sales = base_sales as f64 * (1.0 + sentiment_polarity * sentiment_weight);

    ProductForecast {
        product_id: product.id,
        base_sales,
        sentiment_polarity,
        forecasted_sales,
    }
}

/// A stored forecast row alongside the numbers that produced it
#[derive(Debug, Clone, Serialize)]
pub struct StoredForecast {
    pub forecast: ProductForecast,
    pub record: sales_forecast::Model,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastEvaluationRow {
    pub product_id: Uuid,
    pub name: String,
    pub base_sales: u64,
    pub forecasted_sales: f64,
}

/// Forecast versus base sales over the whole catalog
#[derive(Debug, Clone, Serialize)]
pub struct ForecastEvaluation {
    pub rows: Vec<ForecastEvaluationRow>,
    pub metrics: RegressionMetrics,
}

#[derive(Clone)]
pub struct ForecastService {
    products: ProductRepository,
    forecasts: ForecastRepository,
    analyzer: SentimentAnalyzer,
    config: ForecastConfig,
}

impl ForecastService {
    pub fn new(db: Arc<DatabaseConnection>, config: ForecastConfig) -> Self {
        Self {
            products: ProductRepository::new(db.clone()),
            forecasts: ForecastRepository::new(db),
            analyzer: SentimentAnalyzer::new(),
            config,
        }
    }

    pub fn default_period(&self) -> ForecastPeriod {
        self.config.default_period
    }

    pub fn forecast_product(&self, product: &product::Model) -> ProductForecast {
        forecast_sales_for_product(product, &self.analyzer, self.config.sentiment_weight)
    }

    /// Forecast every product and upsert one row per (product, date, period)
    #[instrument(skip(self))]
    pub async fn forecast_and_store_sales(
        &self,
        forecast_date: NaiveDate,
        period: ForecastPeriod,
    ) -> Result<Vec<StoredForecast>, ServiceError> {
        let products = self.products.find_all().await?;
        let mut stored = Vec::with_capacity(products.len());

        for product in &products {
            let forecast = self.forecast_product(product);
            let (predicted, capped) = storable_forecast(forecast.forecasted_sales);
            if capped {
                counter!("bi_crm_forecast.capped", 1);
                warn!(
                    product = %product.name,
                    forecast = forecast.forecasted_sales,
                    stored = %predicted,
                    "forecast exceeds the stored range and was capped"
                );
            }

            let (record, created) = self
                .forecasts
                .upsert(product.id, forecast_date, period, predicted)
                .await?;

            debug!(
                product = %product.name,
                base_sales = forecast.base_sales,
                polarity = forecast.sentiment_polarity,
                predicted = %predicted,
                created,
                "forecast stored"
            );
            stored.push(StoredForecast {
                forecast,
                record,
                created,
            });
        }

        counter!("bi_crm_forecast.stored", stored.len() as u64);
        info!(
            products = stored.len(),
            %forecast_date,
            %period,
            "sales forecast updated for all products"
        );
        Ok(stored)
    }

    /// MAE, RMSE and MAPE of the forecast against base sales; `None` without products
    #[instrument(skip(self))]
    pub async fn evaluate_sales_forecast(&self) -> Result<Option<ForecastEvaluation>, ServiceError> {
        let products = self.products.find_all().await?;
        if products.is_empty() {
            return Ok(None);
        }

        let rows: Vec<ForecastEvaluationRow> = products
            .iter()
            .map(|product| {
                let forecast = self.forecast_product(product);
                ForecastEvaluationRow {
                    product_id: product.id,
                    name: product.name.clone(),
                    base_sales: forecast.base_sales,
                    forecasted_sales: forecast.forecasted_sales,
                }
            })
            .collect();

        let actual: Vec<f64> = rows.iter().map(|r| r.base_sales as f64).collect();
        let predicted: Vec<f64> = rows.iter().map(|r| r.forecasted_sales).collect();
        let Some(metrics) = RegressionMetrics::compute(&actual, &predicted) else {
            return Ok(None);
        };

        info!(
            mae = metrics.mae,
            rmse = metrics.rmse,
            mape = ?metrics.mape,
            "sales forecast evaluated"
        );
        Ok(Some(ForecastEvaluation { rows, metrics }))
    }

    /// Stored forecasts for a product, newest first
    #[instrument(skip(self))]
    pub async fn forecasts_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<sales_forecast::Model>, ServiceError> {
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        self.forecasts.for_product(product_id).await
    }
}
