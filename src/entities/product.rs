use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity, mostly populated by the ingestion job
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// External marketplace identifier; upsert key for ingestion
    #[sea_orm(unique)]
    pub asin: Option<String>,

    pub category: Option<String>,

    /// Parsed selling price
    pub price: Option<Decimal>,

    /// Original (list) price exactly as the marketplace reported it, symbols included
    pub original_price: Option<String>,

    pub currency: Option<String>,
    pub country: Option<String>,

    // Details and description
    pub description: Option<String>,
    pub product_byline: Option<String>,
    pub product_byline_link: Option<String>,
    pub rating: Option<f64>,
    pub product_num_ratings: Option<i32>,
    pub product_url: Option<String>,
    pub product_photo: Option<String>,
    pub product_num_offers: Option<i32>,
    pub product_availability: Option<String>,

    // Marketplace flags
    pub is_best_seller: bool,
    pub is_amazon_choice: bool,
    pub is_prime: bool,
    pub climate_pledge_friendly: bool,

    /// Free text such as "2K+ bought in past month"; drives the forecast
    pub sales_volume: Option<String>,

    /// Free-text review summary; drives the sentiment adjustment
    pub customers_say: Option<String>,

    // Structured details kept as raw JSON
    pub product_information: Option<Json>,
    pub product_details: Option<Json>,

    // Media
    pub product_photos: Option<Json>,
    pub product_videos: Option<Json>,
    pub video_thumbnail: Option<String>,
    pub has_video: bool,

    // Delivery
    pub delivery: Option<String>,
    pub primary_delivery_time: Option<String>,

    // Category and variations
    pub category_path: Option<Json>,
    pub product_variations: Option<Json>,

    // Deal and brand
    pub deal_badge: Option<String>,
    pub has_aplus: bool,
    pub has_brandstory: bool,

    pub more_info: Option<Json>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Product entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_forecast::Entity")]
    SalesForecasts,
    #[sea_orm(has_many = "super::price_history::Entity")]
    PriceHistory,
}

impl Related<super::sales_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesForecasts.def()
    }
}

impl Related<super::price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistory.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }

            // Set default values for flag fields if not set
            for flag in [
                &mut active_model.is_best_seller,
                &mut active_model.is_amazon_choice,
                &mut active_model.is_prime,
                &mut active_model.climate_pledge_friendly,
                &mut active_model.has_video,
                &mut active_model.has_aplus,
                &mut active_model.has_brandstory,
            ] {
                if let ActiveValue::NotSet = flag {
                    *flag = Set(false);
                }
            }

            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}
