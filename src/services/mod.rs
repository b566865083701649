pub mod churn;
pub mod customers;
pub mod forecasting;
pub mod ingestion;
pub mod insights;

pub use churn::{ChurnService, TrainedChurnModel, TrainingOutcome};
pub use customers::{CustomerService, NewCustomer};
pub use forecasting::ForecastService;
pub use ingestion::{IngestionError, IngestionOutcome, IngestionReport, IngestionService};
pub use insights::InsightsService;
