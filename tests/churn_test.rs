mod common;

use assert_matches::assert_matches;
use bi_crm::{
    errors::ServiceError,
    repositories::CustomerRepository,
    services::{churn::ChurnFeatures, TrainingOutcome},
};
use common::{date, TestDb};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Ten recent buyers and ten customers who went quiet right after registering
async fn seed_two_classes(db: &TestDb, today: chrono::NaiveDate) {
    for i in 0..20i64 {
        let email = format!("customer{}@example.com", i);
        if i % 2 == 0 {
            db.customer(&email, today, 100 + i * 30, Some(5), dec!(1.0)).await;
        } else {
            let tenure = 700 + i * 10;
            db.customer(&email, today, tenure, Some(tenure - 1), dec!(1.0)).await;
        }
    }
}

#[tokio::test]
async fn initial_scores_follow_the_heuristic() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    let half = db.customer("half@example.com", today, 99, Some(50), dec!(1.0)).await;
    let never = db.customer("never@example.com", today, 30, None, dec!(1.0)).await;

    let churn = db.state.churn_service();
    let updated = churn.generate_initial_churn_scores(today).await.unwrap();
    assert_eq!(updated, 2);

    assert_eq!(churn.churn_score_for_customer(half.id).await.unwrap(), Some(dec!(0.50)));
    // 365 / 31 clamps to 1
    assert_eq!(churn.churn_score_for_customer(never.id).await.unwrap(), Some(dec!(1.00)));
}

#[tokio::test]
async fn too_few_customers_skip_training() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    for i in 0..5 {
        db.customer(&format!("c{}@example.com", i), today, 200, Some(150), dec!(1.0))
            .await;
    }

    let outcome = db.state.churn_service().train_churn_model(today).await.unwrap();
    assert_matches!(outcome, TrainingOutcome::InsufficientData { customers: 5, .. });
}

#[tokio::test]
async fn tenth_customer_unlocks_training() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    for i in 0..10i64 {
        let email = format!("customer{}@example.com", i);
        if i % 2 == 0 {
            db.customer(&email, today, 100 + i * 30, Some(5), dec!(1.0)).await;
        } else {
            let tenure = 700 + i * 10;
            db.customer(&email, today, tenure, Some(tenure - 1), dec!(1.0)).await;
        }

        let outcome = db.state.churn_service().train_churn_model(today).await.unwrap();
        if i < 9 {
            let seeded = (i + 1) as usize;
            assert_matches!(outcome, TrainingOutcome::InsufficientData { customers, .. } if customers == seeded);
        } else {
            let model = outcome.into_model().expect("ten customers should train");
            assert_eq!(model.train_size(), 8);
            assert_eq!(model.test_size(), 2);
        }
    }
}

#[tokio::test]
async fn single_class_training_split_is_reported() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    for i in 0..12 {
        db.customer(&format!("c{}@example.com", i), today, 400, Some(3), dec!(1.0))
            .await;
    }

    let outcome = db.state.churn_service().train_churn_model(today).await.unwrap();
    assert_matches!(outcome, TrainingOutcome::InsufficientData { customers: 12, ref reason } if reason.contains("single class"));
}

#[tokio::test]
async fn trained_model_scores_every_customer() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    seed_two_classes(&db, today).await;

    let churn = db.state.churn_service();
    let model = churn
        .train_churn_model(today)
        .await
        .unwrap()
        .into_model()
        .expect("two classes should train");
    assert_eq!(model.train_size(), 16);
    assert_eq!(model.test_size(), 4);

    let metrics = churn.evaluate_churn_model(&model);
    assert_eq!(metrics.support, 4);
    assert!(metrics.accuracy >= 0.75, "accuracy {}", metrics.accuracy);

    let quiet = ChurnFeatures {
        tenure_days: 800,
        last_purchase_gap_days: 799,
    };
    let active = ChurnFeatures {
        tenure_days: 800,
        last_purchase_gap_days: 5,
    };
    assert!(model.predict_proba(&quiet) > model.predict_proba(&active));

    let updated = churn.predict_and_update_churn(&model, today).await.unwrap();
    assert_eq!(updated, 20);

    let repo = CustomerRepository::new(db.state.db.clone());
    for customer in repo.find_all().await.unwrap() {
        let score = customer.churn_score.expect("score written");
        assert!(score >= dec!(0) && score <= dec!(1));

        let predictions = repo.predictions_for(customer.id).await.unwrap();
        assert_eq!(predictions.len(), 1);
        let p = predictions[0].churn_probability;
        assert!((0.0..=1.0).contains(&p));
    }
}

#[tokio::test]
async fn unknown_customer_score_is_not_found() {
    let db = TestDb::new().await;
    let err = db
        .state
        .churn_service()
        .churn_score_for_customer(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
