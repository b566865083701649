use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod customer_repository;
pub mod forecast_repository;
pub mod order_repository;
pub mod product_repository;
pub mod review_repository;

pub use customer_repository::CustomerRepository;
pub use forecast_repository::ForecastRepository;
pub use order_repository::OrderRepository;
pub use product_repository::ProductRepository;
pub use review_repository::ReviewRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
