mod common;

use assert_matches::assert_matches;
use bi_crm::{
    entities::{price_history, product, review},
    errors::ServiceError,
    repositories::ReviewRepository,
};
use chrono::{Duration, TimeZone, Utc};
use common::{date, TestDb};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

async fn ranked_product(db: &TestDb, name: &str, best_seller: bool, rating: f64) -> product::Model {
    db.products()
        .create(product::ActiveModel {
            name: Set(name.to_string()),
            is_best_seller: Set(best_seller),
            rating: Set(Some(rating)),
            price: Set(Some(dec!(100))),
            ..Default::default()
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn recommendations_skip_purchased_and_rank_best_sellers_first() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    let buyer = db.customer("buyer@example.com", today, 100, Some(10), dec!(1.0)).await;

    let bought = ranked_product(&db, "Bought", true, 4.0).await;
    let best_seller = ranked_product(&db, "Best seller", true, 3.0).await;
    let top_rated = ranked_product(&db, "Top rated", false, 4.8).await;
    let decent = ranked_product(&db, "Decent", false, 4.5).await;
    ranked_product(&db, "Weak", false, 2.0).await;
    db.order(&buyer, &bought, "ORD-1").await;

    let recommendations = db
        .state
        .insights_service()
        .recommend_products(buyer.id, 3)
        .await
        .unwrap();
    let ids: Vec<Uuid> = recommendations.iter().map(|r| r.product_id).collect();
    assert_eq!(ids, vec![best_seller.id, top_rated.id, decent.id]);
}

#[tokio::test]
async fn recommendations_for_unknown_customer_fail() {
    let db = TestDb::new().await;
    let err = db
        .state
        .insights_service()
        .recommend_products(Uuid::new_v4(), 3)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn pricing_trends_average_the_latest_five_observations() {
    let db = TestDb::new().await;
    let product = ranked_product(&db, "Tracked", false, 4.0).await;

    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    for (i, price) in [dec!(10), dec!(20), dec!(30), dec!(40), dec!(50), dec!(65)]
        .into_iter()
        .enumerate()
    {
        price_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            platform: Set("Amazon".to_string()),
            price: Set(price),
            scraped_date: Set(start + Duration::days(i as i64)),
        }
        .insert(db.state.db.as_ref())
        .await
        .unwrap();
    }

    let trends = db
        .state
        .insights_service()
        .pricing_trends(product.id)
        .await
        .unwrap();
    assert_eq!(
        trends.price_trends,
        vec![dec!(20), dec!(30), dec!(40), dec!(50), dec!(65)]
    );
    assert_eq!(trends.suggested_price, Some(dec!(41)));
}

#[tokio::test]
async fn pricing_trends_fall_back_to_current_price() {
    let db = TestDb::new().await;
    let priced = ranked_product(&db, "Priced", false, 4.0).await;
    let unpriced = db.product("Unpriced", None, None).await;
    let insights = db.state.insights_service();

    let trends = insights.pricing_trends(priced.id).await.unwrap();
    assert_eq!(trends.price_trends, vec![dec!(100)]);
    assert_eq!(trends.suggested_price, Some(dec!(100)));

    let trends = insights.pricing_trends(unpriced.id).await.unwrap();
    assert!(trends.price_trends.is_empty());
    assert_eq!(trends.suggested_price, None);
}

#[tokio::test]
async fn review_sentiment_is_scored_once() {
    let db = TestDb::new().await;
    let today = date(2025, 6, 1);
    let reviewer = db.customer("reviewer@example.com", today, 100, Some(10), dec!(1.0)).await;
    let product = db.product("Reviewed", None, None).await;

    let repo = ReviewRepository::new(db.state.db.clone());
    let mut ids = Vec::new();
    for comment in [Some("good"), Some("not good"), None] {
        let created = repo
            .create(review::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(reviewer.id),
                product_id: Set(product.id),
                rating: Set(4),
                comment: Set(comment.map(str::to_string)),
                review_date: Set(Utc::now()),
                sentiment_score: Set(None),
            })
            .await
            .unwrap();
        ids.push(created.id);
    }

    let insights = db.state.insights_service();
    assert_eq!(insights.score_review_sentiment().await.unwrap(), 3);
    assert_eq!(insights.score_review_sentiment().await.unwrap(), 0);

    let mut scores: Vec<Option<Decimal>> = Vec::new();
    for id in ids {
        scores.push(repo.find_by_id(id).await.unwrap().unwrap().sentiment_score);
    }
    assert_eq!(scores, vec![Some(dec!(0.70)), Some(dec!(-0.35)), Some(dec!(0))]);
}
