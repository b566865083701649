//! sea-orm entities for the CRM store

pub mod churn_prediction;
pub mod customer;
pub mod customer_segment;
pub mod order;
pub mod order_item;
pub mod price_history;
pub mod product;
pub mod review;
pub mod sales_forecast;

pub use churn_prediction::Entity as ChurnPrediction;
pub use customer::Entity as Customer;
pub use customer_segment::Entity as CustomerSegment;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use price_history::Entity as PriceHistory;
pub use product::Entity as Product;
pub use review::Entity as Review;
pub use sales_forecast::Entity as SalesForecast;
