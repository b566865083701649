use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::prelude::*;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Lower bound of the per-customer spending factor
pub const SPENDING_FACTOR_MIN: f64 = 0.5;
/// Upper bound of the per-customer spending factor
pub const SPENDING_FACTOR_MAX: f64 = 1.5;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub registration_date: NaiveDate,
    pub last_purchase_date: Option<NaiveDate>,
    /// Estimated likelihood of disengagement in [0, 1], 2 dp
    pub churn_score: Option<Decimal>,
    pub segment_id: Option<Uuid>,
    /// Random multiplier in [0.5, 1.5] fixed at creation
    pub spending_factor: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn spending_factor_f64(&self) -> f64 {
        self.spending_factor.to_f64().unwrap_or(1.0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_segment::Entity",
        from = "Column::SegmentId",
        to = "super::customer_segment::Column::Id"
    )]
    Segment,
}

impl Related<super::customer_segment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Segment.def()
    }
}

/// Draws a spending factor uniformly from [0.5, 1.5], rounded to 2 dp
pub fn random_spending_factor() -> Decimal {
    let raw: f64 = rand::thread_rng().gen_range(SPENDING_FACTOR_MIN..=SPENDING_FACTOR_MAX);
    Decimal::from_f64(raw).unwrap_or(Decimal::ONE).round_dp(2)
}

fn spending_factor_in_range(factor: &Decimal) -> bool {
    factor
        .to_f64()
        .map(|f| (SPENDING_FACTOR_MIN..=SPENDING_FACTOR_MAX).contains(&f))
        .unwrap_or(false)
}

#[async_trait]
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
            if let ActiveValue::NotSet = active_model.registration_date {
                active_model.registration_date = Set(now.date_naive());
            }
            let factor = match active_model.spending_factor.clone() {
                ActiveValue::NotSet => {
                    let factor = random_spending_factor();
                    active_model.spending_factor = Set(factor);
                    factor
                }
                ActiveValue::Set(factor) | ActiveValue::Unchanged(factor) => factor,
            };
            if !spending_factor_in_range(&factor) {
                return Err(DbErr::Custom(format!(
                    "spending factor {} outside [{}, {}]",
                    factor, SPENDING_FACTOR_MIN, SPENDING_FACTOR_MAX
                )));
            }
            active_model.created_at = Set(now);
        } else if active_model.spending_factor.is_set() {
            // Assigned once at insert; later writes are dropped.
            warn!("ignoring attempt to change an existing customer's spending factor");
            active_model.spending_factor = ActiveValue::NotSet;
        }

        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}
