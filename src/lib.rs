//! bi-crm library
//!
//! Relational CRM store plus the batch jobs that run over it: product
//! ingestion from a marketplace API, churn scoring and sales forecasting.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod ml;
pub mod repositories;
pub mod scraper;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

use crate::errors::ServiceError;
use crate::scraper::ProductDetailsApi;
use crate::services::{
    ChurnService, CustomerService, ForecastService, IngestionService, InsightsService,
};

/// Shared database handle and configuration, handing out services
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        Self { db, config }
    }

    /// Open the pool described by `config`, migrating first when `auto_migrate` is set
    pub async fn connect(config: config::AppConfig) -> Result<Self, ServiceError> {
        let pool = db::establish_connection_from_app_config(&config).await?;
        if config.auto_migrate {
            db::run_migrations(&pool).await?;
        } else {
            info!("auto_migrate disabled; skipping migrations");
        }
        Ok(Self::new(Arc::new(pool), config))
    }

    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(self.db.clone())
    }

    pub fn churn_service(&self) -> ChurnService {
        ChurnService::new(self.db.clone(), self.config.churn.clone())
    }

    pub fn forecast_service(&self) -> ForecastService {
        ForecastService::new(self.db.clone(), self.config.forecast.clone())
    }

    pub fn insights_service(&self) -> InsightsService {
        InsightsService::new(self.db.clone())
    }

    pub fn ingestion_service(&self, api: Arc<dyn ProductDetailsApi>) -> IngestionService {
        IngestionService::new(self.db.clone(), api)
    }
}
