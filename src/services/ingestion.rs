use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::price_history::Platform;
use crate::entities::product::ActiveModel as ProductActiveModel;
use crate::errors::ServiceError;
use crate::repositories::ProductRepository;
use crate::scraper::{
    parse_decimal_value, parse_star_rating, ApiEnvelope, CredentialPool, ProductData,
    ProductDetailsApi,
};

/// What happened to a single ASIN during an ingestion run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Stored {
        asin: String,
        product_id: Uuid,
        created: bool,
        price_recorded: bool,
    },
    Skipped {
        asin: String,
        reason: String,
    },
}

impl IngestionOutcome {
    pub fn asin(&self) -> &str {
        match self {
            Self::Stored { asin, .. } | Self::Skipped { asin, .. } => asin,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Per-item results of an ingestion run, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionReport {
    pub outcomes: Vec<IngestionOutcome>,
}

impl IngestionReport {
    pub fn stored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_stored()).count()
    }

    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, IngestionOutcome::Stored { created: true, .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.stored()
    }
}

#[derive(Debug, Error)]
pub enum IngestionError {
    /// Every key in the pool hit its quota; `partial` holds the items
    /// processed before the run stopped.
    #[error("all {pool_size} API keys have exceeded their monthly quota")]
    CredentialsExhausted {
        pool_size: usize,
        partial: IngestionReport,
    },
}

/// Pulls product details for ASINs and upserts them into the catalog
#[derive(Clone)]
pub struct IngestionService {
    products: ProductRepository,
    api: Arc<dyn ProductDetailsApi>,
}

impl IngestionService {
    pub fn new(db: Arc<DatabaseConnection>, api: Arc<dyn ProductDetailsApi>) -> Self {
        Self {
            products: ProductRepository::new(db),
            api,
        }
    }

    /// Fetch and store every ASIN in order.
    ///
    /// A quota response moves the pool to its next key and retries the same
    /// ASIN. Any other failure skips the ASIN and the run carries on. The run
    /// stops only when the pool runs out of keys.
    #[instrument(skip(self, asins, pool), fields(asins = asins.len(), keys = pool.len()))]
    pub async fn scrape_and_store_products(
        &self,
        asins: &[String],
        pool: &mut CredentialPool,
    ) -> Result<IngestionReport, IngestionError> {
        let mut report = IngestionReport::default();

        for asin in asins {
            let outcome = loop {
                let response = self
                    .api
                    .fetch_product_details(asin, pool.active_key())
                    .await;

                match response {
                    Ok(envelope) if envelope.is_quota_exceeded() => {
                        counter!("bi_crm_ingestion.quota_exhausted", 1);
                        warn!(asin = %asin, key_index = pool.active_index(), "API key quota exceeded");
                        if pool.advance().is_none() {
                            warn!(pool_size = pool.len(), "credential pool exhausted; stopping run");
                            return Err(IngestionError::CredentialsExhausted {
                                pool_size: pool.len(),
                                partial: report,
                            });
                        }
                        info!(key_index = pool.active_index(), "switched to next API key");
                    }
                    Ok(envelope) => break self.store(asin, envelope).await,
                    Err(e) => break skipped(asin, format!("request failed ({}): {}", e.kind(), e)),
                }
            };

            match &outcome {
                IngestionOutcome::Stored { created, .. } => {
                    counter!("bi_crm_ingestion.stored", 1);
                    info!(asin = %asin, created, "product stored");
                }
                IngestionOutcome::Skipped { reason, .. } => {
                    counter!("bi_crm_ingestion.skipped", 1);
                    warn!(asin = %asin, reason = %reason, "product skipped");
                }
            }
            report.outcomes.push(outcome);
        }

        info!(
            stored = report.stored(),
            created = report.created(),
            skipped = report.skipped(),
            "ingestion run finished"
        );
        Ok(report)
    }

    async fn store(&self, asin: &str, envelope: ApiEnvelope) -> IngestionOutcome {
        if !envelope.is_ok() {
            return skipped(
                asin,
                format!(
                    "API returned status {}: {}",
                    envelope.status.as_deref().unwrap_or("<missing>"),
                    envelope.message.as_deref().unwrap_or("no message")
                ),
            );
        }
        let Some(data) = envelope.data else {
            return skipped(asin, "response carried no product data".to_string());
        };

        match self.persist(asin, data).await {
            Ok(outcome) => outcome,
            Err(e) => skipped(asin, format!("store error: {}", e)),
        }
    }

    async fn persist(&self, asin: &str, data: ProductData) -> Result<IngestionOutcome, ServiceError> {
        let price = data.product_price.as_deref().and_then(parse_decimal_value);
        let fields = product_fields(asin, data, price);

        let (product, created) = self.products.upsert_by_asin(asin, fields).await?;

        let price_recorded = match price {
            Some(price) => {
                self.products
                    .append_price(product.id, Platform::Amazon, price)
                    .await?;
                true
            }
            None => false,
        };

        Ok(IngestionOutcome::Stored {
            asin: asin.to_string(),
            product_id: product.id,
            created,
            price_recorded,
        })
    }
}

fn skipped(asin: &str, reason: String) -> IngestionOutcome {
    IngestionOutcome::Skipped {
        asin: asin.to_string(),
        reason,
    }
}

/// Map API attributes onto a product row. Every descriptive column is set so
/// an update overwrites whatever was stored before.
fn product_fields(asin: &str, data: ProductData, price: Option<Decimal>) -> ProductActiveModel {
    let rating = data.product_star_rating.as_deref().and_then(parse_star_rating);

    ProductActiveModel {
        name: Set(data.product_title.unwrap_or_else(|| asin.to_string())),
        category: Set(data.category),
        price: Set(price),
        original_price: Set(data.product_original_price),
        currency: Set(data.currency),
        country: Set(data.country),
        description: Set(data.product_description),
        product_byline: Set(data.product_byline),
        product_byline_link: Set(data.product_byline_link),
        rating: Set(rating),
        product_num_ratings: Set(data.product_num_ratings),
        product_url: Set(data.product_url),
        product_photo: Set(data.product_photo),
        product_num_offers: Set(data.product_num_offers),
        product_availability: Set(data.product_availability),
        is_best_seller: Set(data.is_best_seller.unwrap_or(false)),
        is_amazon_choice: Set(data.is_amazon_choice.unwrap_or(false)),
        is_prime: Set(data.is_prime.unwrap_or(false)),
        climate_pledge_friendly: Set(data.climate_pledge_friendly.unwrap_or(false)),
        sales_volume: Set(data.sales_volume),
        customers_say: Set(data.customers_say),
        product_information: Set(data.product_information),
        product_details: Set(data.product_details),
        product_photos: Set(data.product_photos),
        product_videos: Set(data.product_videos),
        video_thumbnail: Set(data.video_thumbnail),
        has_video: Set(data.has_video.unwrap_or(false)),
        delivery: Set(data.delivery),
        primary_delivery_time: Set(data.primary_delivery_time),
        category_path: Set(data.category_path),
        product_variations: Set(data.product_variations),
        deal_badge: Set(data.deal_badge),
        has_aplus: Set(data.has_aplus.unwrap_or(false)),
        has_brandstory: Set(data.has_brandstory.unwrap_or(false)),
        more_info: Set(data.more_info),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn maps_attributes_and_defaults() {
        let data = ProductData {
            product_price: Some("₹1,299.00".into()),
            product_original_price: Some("₹1,999.00".into()),
            product_star_rating: Some("4.3".into()),
            is_prime: Some(true),
            ..Default::default()
        };
        let price = data.product_price.as_deref().and_then(parse_decimal_value);
        let fields = product_fields("B000TEST01", data, price);

        assert_eq!(fields.name, Set("B000TEST01".to_string()));
        assert_eq!(fields.price, Set(Some(dec!(1299.00))));
        assert_eq!(fields.original_price, Set(Some("₹1,999.00".to_string())));
        assert_eq!(fields.rating, Set(Some(4.3)));
        assert_eq!(fields.is_prime, Set(true));
        assert_eq!(fields.is_best_seller, Set(false));
    }

    #[test]
    fn rating_phrasing_keeps_the_leading_number() {
        let data = ProductData {
            product_star_rating: Some("4.5 out of 5 stars".into()),
            ..Default::default()
        };
        assert_eq!(product_fields("B000TEST02", data, None).rating, Set(Some(4.5)));

        let data = ProductData {
            product_star_rating: Some("no ratings yet".into()),
            ..Default::default()
        };
        assert_eq!(product_fields("B000TEST03", data, None).rating, Set(None));
    }

    #[test]
    fn report_counts() {
        let report = IngestionReport {
            outcomes: vec![
                IngestionOutcome::Stored {
                    asin: "A".into(),
                    product_id: Uuid::nil(),
                    created: true,
                    price_recorded: false,
                },
                IngestionOutcome::Stored {
                    asin: "B".into(),
                    product_id: Uuid::nil(),
                    created: false,
                    price_recorded: true,
                },
                skipped("C", "boom".into()),
            ],
        };
        assert_eq!(report.stored(), 2);
        assert_eq!(report.created(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcomes[2].asin(), "C");
    }
}
