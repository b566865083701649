mod common;

use assert_matches::assert_matches;
use bi_crm::{
    entities::customer, errors::ServiceError, repositories::CustomerRepository,
    services::NewCustomer,
};
use common::{date, TestDb};
use rust_decimal_macros::dec;
use sea_orm::Set;

fn new_customer(email: &str) -> NewCustomer {
    NewCustomer {
        first_name: "Asha".to_string(),
        last_name: "Sharma".to_string(),
        email: email.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn spending_factor_is_drawn_once_within_range() {
    let db = TestDb::new().await;
    let service = db.state.customer_service();

    for i in 0..10 {
        let created = service
            .create_customer(new_customer(&format!("asha{}@example.com", i)))
            .await
            .unwrap();
        assert!(created.spending_factor >= dec!(0.5) && created.spending_factor <= dec!(1.5));
        assert_eq!(created.spending_factor, created.spending_factor.round_dp(2));
    }
}

#[tokio::test]
async fn spending_factor_ignores_updates() {
    let db = TestDb::new().await;
    let created = db
        .state
        .customer_service()
        .create_customer(NewCustomer {
            spending_factor: Some(dec!(1.2)),
            ..new_customer("fixed@example.com")
        })
        .await
        .unwrap();

    let repo = CustomerRepository::new(db.state.db.clone());
    let mut active: customer::ActiveModel = created.clone().into();
    active.first_name = Set("Meera".to_string());
    active.spending_factor = Set(dec!(0.7));
    repo.update(active).await.unwrap();

    let reloaded = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(reloaded.first_name, "Meera");
    assert_eq!(reloaded.spending_factor, dec!(1.2));
}

#[tokio::test]
async fn registration_date_defaults_to_today() {
    let db = TestDb::new().await;
    let created = db
        .state
        .customer_service()
        .create_customer(new_customer("today@example.com"))
        .await
        .unwrap();
    assert_eq!(created.registration_date, chrono::Utc::now().date_naive());
    assert_eq!(created.churn_score, None);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let db = TestDb::new().await;
    let service = db.state.customer_service();
    service
        .create_customer(new_customer("dup@example.com"))
        .await
        .unwrap();

    let err = service
        .create_customer(new_customer("dup@example.com"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn out_of_range_spending_factor_fails_validation() {
    let db = TestDb::new().await;
    let err = db
        .state
        .customer_service()
        .create_customer(NewCustomer {
            spending_factor: Some(dec!(2.0)),
            ..new_customer("big@example.com")
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn record_purchase_keeps_the_latest_date() {
    let db = TestDb::new().await;
    let service = db.state.customer_service();
    let created = service
        .create_customer(new_customer("buyer@example.com"))
        .await
        .unwrap();

    service.record_purchase(created.id, date(2025, 3, 1)).await.unwrap();
    let after_older = service.record_purchase(created.id, date(2025, 1, 1)).await.unwrap();
    assert_eq!(after_older.last_purchase_date, Some(date(2025, 3, 1)));

    let after_newer = service.record_purchase(created.id, date(2025, 4, 1)).await.unwrap();
    assert_eq!(after_newer.last_purchase_date, Some(date(2025, 4, 1)));
}
