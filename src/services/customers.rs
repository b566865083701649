use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::customer::{
    self, ActiveModel as CustomerActiveModel, SPENDING_FACTOR_MAX, SPENDING_FACTOR_MIN,
};
use crate::errors::ServiceError;
use crate::repositories::CustomerRepository;

/// Input for registering a customer
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    /// Defaults to the day the row is inserted
    pub registration_date: Option<NaiveDate>,
    pub last_purchase_date: Option<NaiveDate>,
    pub segment_id: Option<Uuid>,
    /// Drawn at random when absent
    #[validate(custom = "validate_spending_factor")]
    pub spending_factor: Option<Decimal>,
}

fn validate_spending_factor(factor: &Decimal) -> Result<(), ValidationError> {
    let in_range = factor
        .to_f64()
        .map(|f| (SPENDING_FACTOR_MIN..=SPENDING_FACTOR_MAX).contains(&f))
        .unwrap_or(false);
    if in_range {
        Ok(())
    } else {
        let mut err = ValidationError::new("spending_factor");
        err.message = Some("spending factor must lie in [0.5, 1.5]".into());
        Err(err)
    }
}

fn optional<T: Into<sea_orm::Value>>(value: Option<T>) -> ActiveValue<T> {
    match value {
        Some(v) => Set(v),
        None => ActiveValue::NotSet,
    }
}

/// Service for registering and reading customers
#[derive(Clone)]
pub struct CustomerService {
    customers: CustomerRepository,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            customers: CustomerRepository::new(db),
        }
    }

    /// Registers a customer after validating the input
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(&self, input: NewCustomer) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        if self.customers.find_by_email(&input.email).await?.is_some() {
            return Err(ServiceError::InvalidInput(format!(
                "a customer with email {} already exists",
                input.email
            )));
        }

        let model = CustomerActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            registration_date: optional(input.registration_date),
            last_purchase_date: Set(input.last_purchase_date),
            churn_score: Set(None),
            segment_id: Set(input.segment_id),
            spending_factor: optional(input.spending_factor.map(|f| f.round_dp(2))),
            ..Default::default()
        };

        let created = self.customers.create(model).await?;
        info!(customer_id = %created.id, "customer registered");
        Ok(created)
    }

    /// Gets a customer by ID
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    /// Lists all customers
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<customer::Model>, ServiceError> {
        self.customers.find_all().await
    }

    /// Records a purchase date, keeping the latest one
    #[instrument(skip(self))]
    pub async fn record_purchase(
        &self,
        id: Uuid,
        purchased_on: NaiveDate,
    ) -> Result<customer::Model, ServiceError> {
        let existing = self.get_customer(id).await?;
        if existing
            .last_purchase_date
            .is_some_and(|last| last >= purchased_on)
        {
            return Ok(existing);
        }

        let mut active_model: CustomerActiveModel = existing.into();
        active_model.last_purchase_date = Set(Some(purchased_on));
        self.customers.update(active_model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid() -> NewCustomer {
        NewCustomer {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_input() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        let input = NewCustomer {
            email: "not-an-email".into(),
            ..valid()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_spending_factor() {
        let input = NewCustomer {
            spending_factor: Some(dec!(2.0)),
            ..valid()
        };
        assert!(input.validate().is_err());

        let input = NewCustomer {
            spending_factor: Some(dec!(1.25)),
            ..valid()
        };
        assert!(input.validate().is_ok());
    }
}
