use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ServiceError;
use crate::ml::SentimentAnalyzer;
use crate::repositories::{CustomerRepository, OrderRepository, ProductRepository, ReviewRepository};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;
/// Number of most recent price observations a trend is built from
pub const PRICE_TREND_WINDOW: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecommendation {
    pub product_id: Uuid,
    pub name: String,
    pub asin: Option<String>,
    pub rating: Option<f64>,
    pub is_best_seller: bool,
}

impl From<&product::Model> for ProductRecommendation {
    fn from(product: &product::Model) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            asin: product.asin.clone(),
            rating: product.rating,
            is_best_seller: product.is_best_seller,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingTrends {
    pub product_id: Uuid,
    /// Oldest first
    pub price_trends: Vec<Decimal>,
    pub suggested_price: Option<Decimal>,
}

/// Best sellers first, then higher rating, then more ratings. Missing values sort last.
fn recommendation_order(a: &product::Model, b: &product::Model) -> Ordering {
    fn desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    b.is_best_seller
        .cmp(&a.is_best_seller)
        .then_with(|| desc(a.rating, b.rating))
        .then_with(|| desc(a.product_num_ratings, b.product_num_ratings))
        .then_with(|| a.name.cmp(&b.name))
}

/// Read-side analytics over customers, products and reviews
#[derive(Clone)]
pub struct InsightsService {
    customers: CustomerRepository,
    products: ProductRepository,
    orders: OrderRepository,
    reviews: ReviewRepository,
    analyzer: SentimentAnalyzer,
}

impl InsightsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            customers: CustomerRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            orders: OrderRepository::new(db.clone()),
            reviews: ReviewRepository::new(db),
            analyzer: SentimentAnalyzer::new(),
        }
    }

    /// Up to `limit` products the customer has not ordered yet
    #[instrument(skip(self))]
    pub async fn recommend_products(
        &self,
        customer_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ProductRecommendation>, ServiceError> {
        if self.customers.find_by_id(customer_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Customer {} not found",
                customer_id
            )));
        }

        let purchased = self.orders.purchased_product_ids(customer_id).await?;
        let mut candidates: Vec<product::Model> = self
            .products
            .find_all()
            .await?
            .into_iter()
            .filter(|p| !purchased.contains(&p.id))
            .collect();
        candidates.sort_by(recommendation_order);

        Ok(candidates
            .iter()
            .take(limit)
            .map(ProductRecommendation::from)
            .collect())
    }

    /// Recent price observations and their mean as a suggested price
    #[instrument(skip(self))]
    pub async fn pricing_trends(&self, product_id: Uuid) -> Result<PricingTrends, ServiceError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let mut price_trends: Vec<Decimal> = self
            .products
            .recent_prices(product_id, PRICE_TREND_WINDOW)
            .await?
            .into_iter()
            .map(|row| row.price)
            .collect();

        if price_trends.is_empty() {
            price_trends.extend(product.price);
        }

        let suggested_price = if price_trends.is_empty() {
            None
        } else {
            let sum: Decimal = price_trends.iter().copied().sum();
            Some((sum / Decimal::from(price_trends.len())).round_dp(2))
        };

        Ok(PricingTrends {
            product_id,
            price_trends,
            suggested_price,
        })
    }

    /// Score every review that has no sentiment yet. Returns the number scored.
    #[instrument(skip(self))]
    pub async fn score_review_sentiment(&self) -> Result<usize, ServiceError> {
        let pending = self.reviews.find_unscored().await?;
        let total = pending.len();

        for review in pending {
            let polarity = self.analyzer.polarity_of(review.comment.as_deref());
            let score = Decimal::from_f64(polarity)
                .unwrap_or(Decimal::ZERO)
                .round_dp(2);
            self.reviews.set_sentiment(review, score).await?;
        }

        info!(reviews = total, "review sentiment scored");
        Ok(total)
    }
}
