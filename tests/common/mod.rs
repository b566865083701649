#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::Set;
use tempfile::TempDir;
use uuid::Uuid;

use bi_crm::{
    config::AppConfig,
    entities::{customer, order, order_item, product},
    repositories::{OrderRepository, ProductRepository},
    services::NewCustomer,
    AppState,
};

/// Application state backed by a throwaway SQLite file with the schema applied.
pub struct TestDb {
    pub state: AppState,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}/test.db?mode=rwc", dir.path().display());

        let mut cfg = AppConfig::new(url, "test".to_string());
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let state = AppState::connect(cfg)
            .await
            .expect("failed to create test database");

        Self { state, _dir: dir }
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.state.db.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.state.db.clone())
    }

    /// Customer registered `tenure_days` before `today` who last bought
    /// `gap_days` before `today` (never, when `None`).
    pub async fn customer(
        &self,
        email: &str,
        today: NaiveDate,
        tenure_days: i64,
        gap_days: Option<i64>,
        spending_factor: Decimal,
    ) -> customer::Model {
        self.state
            .customer_service()
            .create_customer(NewCustomer {
                first_name: "Test".to_string(),
                last_name: "Customer".to_string(),
                email: email.to_string(),
                registration_date: Some(today - Duration::days(tenure_days)),
                last_purchase_date: gap_days.map(|gap| today - Duration::days(gap)),
                spending_factor: Some(spending_factor),
                ..Default::default()
            })
            .await
            .expect("create customer")
    }

    pub async fn product(&self, name: &str, sales_volume: Option<&str>, customers_say: Option<&str>) -> product::Model {
        self.products()
            .create(product::ActiveModel {
                name: Set(name.to_string()),
                sales_volume: Set(sales_volume.map(str::to_string)),
                customers_say: Set(customers_say.map(str::to_string)),
                ..Default::default()
            })
            .await
            .expect("create product")
    }

    /// Single-item order of `product` for `customer`
    pub async fn order(&self, customer: &customer::Model, product: &product::Model, number: &str) -> order::Model {
        let orders = self.orders();
        let created = orders
            .create(order::ActiveModel {
                order_number: Set(number.to_string()),
                customer_id: Set(customer.id),
                total_amount: Set(product.price.unwrap_or_default()),
                ..Default::default()
            })
            .await
            .expect("create order");

        orders
            .add_item(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(created.id),
                product_id: Set(product.id),
                quantity: Set(1),
                price_at_purchase: Set(product.price.unwrap_or_default()),
            })
            .await
            .expect("add order item");

        created
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
