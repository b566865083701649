mod common;

use assert_matches::assert_matches;
use bi_crm::{
    entities::sales_forecast::ForecastPeriod, errors::ServiceError, repositories::ForecastRepository,
};
use common::{date, TestDb};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn stores_one_forecast_per_product_date_and_period() {
    let db = TestDb::new().await;
    let neutral = db.product("Neutral", Some("2K+ bought in past month"), None).await;
    let liked = db.product("Liked", Some("2K+ bought in past month"), Some("good")).await;
    let unknown = db.product("Unknown", None, Some("excellent")).await;

    let service = db.state.forecast_service();
    let day = date(2025, 6, 1);
    let stored = service
        .forecast_and_store_sales(day, ForecastPeriod::Monthly)
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|s| s.created));

    let predicted = |id: Uuid| {
        stored
            .iter()
            .find(|s| s.forecast.product_id == id)
            .map(|s| s.record.predicted_sales)
            .unwrap()
    };
    assert_eq!(predicted(neutral.id), dec!(2000));
    assert_eq!(predicted(liked.id), dec!(2700));
    assert_eq!(predicted(unknown.id), dec!(0));

    let again = service
        .forecast_and_store_sales(day, ForecastPeriod::Monthly)
        .await
        .unwrap();
    assert!(again.iter().all(|s| !s.created));

    let repo = ForecastRepository::new(db.state.db.clone());
    assert_eq!(repo.count().await.unwrap(), 3);

    service
        .forecast_and_store_sales(day, ForecastPeriod::Weekly)
        .await
        .unwrap();
    assert_eq!(repo.count().await.unwrap(), 6);
}

#[tokio::test]
async fn forecasts_for_product_are_newest_first() {
    let db = TestDb::new().await;
    let product = db.product("Speaker", Some("300 sold"), None).await;
    let service = db.state.forecast_service();

    for day in [date(2025, 5, 1), date(2025, 7, 1), date(2025, 6, 1)] {
        service
            .forecast_and_store_sales(day, ForecastPeriod::Monthly)
            .await
            .unwrap();
    }

    let forecasts = service.forecasts_for_product(product.id).await.unwrap();
    let dates: Vec<_> = forecasts.iter().map(|f| f.forecast_date).collect();
    assert_eq!(dates, vec![date(2025, 7, 1), date(2025, 6, 1), date(2025, 5, 1)]);
    assert!(forecasts.iter().all(|f| f.period == "Monthly"));
}

#[tokio::test]
async fn forecasts_for_unknown_product_is_not_found() {
    let db = TestDb::new().await;
    let err = db
        .state
        .forecast_service()
        .forecasts_for_product(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn evaluation_needs_products() {
    let db = TestDb::new().await;
    let service = db.state.forecast_service();
    assert!(service.evaluate_sales_forecast().await.unwrap().is_none());

    db.product("Neutral", Some("1K+ sold"), None).await;
    db.product("Liked", Some("1K+ sold"), Some("good")).await;

    let evaluation = service.evaluate_sales_forecast().await.unwrap().unwrap();
    assert_eq!(evaluation.rows.len(), 2);
    // Errors are 0 and 350 against base sales of 1000 each
    assert!((evaluation.metrics.mae - 175.0).abs() < 1e-9);
    assert!((evaluation.metrics.mape.unwrap() - 0.175).abs() < 1e-9);
}

#[tokio::test]
async fn oversized_forecast_is_capped_and_the_run_continues() {
    let db = TestDb::new().await;
    let huge = db
        .product("Viral", Some("99999999999999999999999 bought in past month"), None)
        .await;
    let normal = db.product("Normal", Some("300 sold"), None).await;

    let stored = db
        .state
        .forecast_service()
        .forecast_and_store_sales(date(2025, 6, 1), ForecastPeriod::Monthly)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let record = |id: Uuid| stored.iter().find(|s| s.forecast.product_id == id).unwrap();
    assert_eq!(record(huge.id).forecast.base_sales, u64::MAX);
    assert!(record(huge.id).record.predicted_sales > dec!(9999999999));
    assert_eq!(record(normal.id).record.predicted_sales, dec!(300));
}
