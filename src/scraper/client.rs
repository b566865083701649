use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::ScraperConfig;
use crate::errors::ServiceError;

const QUOTA_EXCEEDED_MARKER: &str = "exceeded the monthly quota";

/// Response envelope returned by the product-details endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<ProductData>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// The provider reports quota exhaustion in `message`, whatever the HTTP status
    pub fn is_quota_exceeded(&self) -> bool {
        self.message
            .as_deref()
            .map(|m| m.to_lowercase().contains(QUOTA_EXCEEDED_MARKER))
            .unwrap_or(false)
    }

    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }
}

/// Product attributes as delivered by the API. Everything is optional and
/// loosely typed on the wire; numbers sometimes arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductData {
    #[serde(deserialize_with = "lenient_text")]
    pub asin: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_price: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_original_price: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_byline: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_byline_link: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_star_rating: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub product_num_ratings: Option<i32>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_photo: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub product_num_offers: Option<i32>,
    #[serde(deserialize_with = "lenient_text")]
    pub product_availability: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_best_seller: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_amazon_choice: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_prime: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub climate_pledge_friendly: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub sales_volume: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub customers_say: Option<String>,
    pub product_information: Option<Value>,
    pub product_details: Option<Value>,
    pub product_photos: Option<Value>,
    pub product_videos: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub video_thumbnail: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_video: Option<bool>,
    #[serde(deserialize_with = "lenient_text")]
    pub delivery: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub primary_delivery_time: Option<String>,
    pub category_path: Option<Value>,
    pub product_variations: Option<Value>,
    #[serde(deserialize_with = "lenient_text")]
    pub deal_badge: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_aplus: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    pub has_brandstory: Option<bool>,
    pub more_info: Option<Value>,
}

/// Accept a string, a number, or an object carrying a `name`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

/// Accept a boolean, `"true"`/`"false"` in any case, or `0`/`1`
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().and_then(|v| match v {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Accept an integer or a string such as `"1,234"`
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

/// Source of product details, keyed by ASIN and authenticated per call
#[async_trait]
pub trait ProductDetailsApi: Send + Sync {
    async fn fetch_product_details(
        &self,
        asin: &str,
        api_key: &str,
    ) -> Result<ApiEnvelope, ServiceError>;
}

/// reqwest-backed client for the RapidAPI product-details endpoint
#[derive(Debug, Clone)]
pub struct RapidApiClient {
    client: Client,
    base_url: String,
    api_host: String,
    country: String,
}

impl RapidApiClient {
    /// Build a client with the configured request timeout
    pub fn new(config: &ScraperConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to construct reqwest client: {}", e))
            })?;

        Ok(Self::with_client(config, client))
    }

    /// Build a client around an existing reqwest client
    pub fn with_client(config: &ScraperConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_host: config.api_host.clone(),
            country: config.country.clone(),
        }
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| ServiceError::InvalidInput(format!("invalid API key: {}", e)))?,
        );
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(&self.api_host)
                .map_err(|e| ServiceError::InvalidInput(format!("invalid API host: {}", e)))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl ProductDetailsApi for RapidApiClient {
    #[instrument(skip(self, api_key))]
    async fn fetch_product_details(
        &self,
        asin: &str,
        api_key: &str,
    ) -> Result<ApiEnvelope, ServiceError> {
        let url = format!("{}/product-details", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("asin", asin), ("country", self.country.as_str())])
            .headers(self.headers(api_key)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "product details response received");

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_quota_message_case_insensitively() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"message": "You have EXCEEDED the MONTHLY quota for Requests on your current plan"}"#,
        )
        .unwrap();
        assert!(envelope.is_quota_exceeded());
        assert!(!envelope.is_ok());
    }

    #[test]
    fn tolerates_loosely_typed_fields() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{
                "status": "OK",
                "data": {
                    "asin": "B000TEST01",
                    "product_title": "Kettle",
                    "category": {"id": "kitchen", "name": "Kitchen"},
                    "product_price": 1299,
                    "product_num_ratings": "1,024",
                    "product_num_offers": 3,
                    "is_prime": true,
                    "product_details": {"Brand": "Acme"},
                    "unexpected": [1, 2, 3]
                }
            }"#,
        )
        .unwrap();
        assert!(envelope.is_ok());
        let data = envelope.data.unwrap();
        assert_eq!(data.category.as_deref(), Some("Kitchen"));
        assert_eq!(data.product_price.as_deref(), Some("1299"));
        assert_eq!(data.product_num_ratings, Some(1024));
        assert_eq!(data.product_num_offers, Some(3));
        assert_eq!(data.is_prime, Some(true));
        assert!(data.is_best_seller.is_none());
    }

    #[test]
    fn tolerates_stringly_flags_and_numeric_text() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{
                "status": "OK",
                "data": {
                    "product_title": 12345,
                    "is_prime": "true",
                    "is_best_seller": "False",
                    "has_video": 1,
                    "is_amazon_choice": "sometimes",
                    "video_thumbnail": ["not", "a", "string"],
                    "product_price": "₹99"
                }
            }"#,
        )
        .unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.product_title.as_deref(), Some("12345"));
        assert_eq!(data.is_prime, Some(true));
        assert_eq!(data.is_best_seller, Some(false));
        assert_eq!(data.has_video, Some(true));
        assert_eq!(data.is_amazon_choice, None);
        assert_eq!(data.video_thumbnail, None);
        assert_eq!(data.product_price.as_deref(), Some("₹99"));
    }
}
