/*!
 * # Churn Scoring
 *
 * Two writers share `customers.churn_score`:
 *
 * - a bootstrap heuristic, `gap / (tenure + 1) * spending_factor` clamped to [0, 1]
 * - a logistic classifier over (tenure, purchase gap), trained on labels
 *   derived from that heuristic
 *
 * Whichever job ran last owns the stored score. Training labels are always
 * recomputed from the heuristic so they do not drift after inference.
 */

use chrono::NaiveDate;
use metrics::counter;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ChurnConfig;
use crate::entities::customer;
use crate::errors::ServiceError;
use crate::ml::{
    train_test_split, ClassificationMetrics, LogisticRegression, LogisticRegressionParams,
    StandardScaler,
};
use crate::repositories::CustomerRepository;

/// Gap assumed for customers who never purchased
pub const NO_PURCHASE_GAP_DAYS: i64 = 365;

/// Heuristic scores above this (0.5) are labelled as churners
pub const CHURN_LABEL_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Inputs to both the heuristic and the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChurnFeatures {
    pub tenure_days: i64,
    pub last_purchase_gap_days: i64,
}

impl ChurnFeatures {
    pub fn for_customer(customer: &customer::Model, today: NaiveDate) -> Self {
        let tenure_days = (today - customer.registration_date).num_days();
        let last_purchase_gap_days = customer
            .last_purchase_date
            .map(|last| (today - last).num_days())
            .unwrap_or(NO_PURCHASE_GAP_DAYS);
        Self {
            tenure_days,
            last_purchase_gap_days,
        }
    }

    pub fn as_row(&self) -> Vec<f64> {
        vec![self.tenure_days as f64, self.last_purchase_gap_days as f64]
    }
}

/// `clamp(0, 1, gap / (tenure + 1) * spending_factor)`.
///
/// Division by zero and other non-finite results clamp as well; an undefined
/// result (0 / 0) scores 0.
pub fn heuristic_churn_score(features: &ChurnFeatures, spending_factor: f64) -> f64 {
    let raw = features.last_purchase_gap_days as f64 / (features.tenure_days as f64 + 1.0)
        * spending_factor;
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// Round a score to the 2 dp stored in the database
pub fn to_stored_score(score: f64) -> Decimal {
    Decimal::from_f64(score)
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// Label used for training: 1 when the stored-precision heuristic exceeds 0.5
pub fn churn_label(customer: &customer::Model, today: NaiveDate) -> u8 {
    let features = ChurnFeatures::for_customer(customer, today);
    let score = to_stored_score(heuristic_churn_score(
        &features,
        customer.spending_factor_f64(),
    ));
    u8::from(score > CHURN_LABEL_THRESHOLD)
}

/// Scaler, classifier and the held-out split they were evaluated on
#[derive(Debug, Clone, Serialize)]
pub struct TrainedChurnModel {
    scaler: StandardScaler,
    classifier: LogisticRegression,
    test_features: Vec<Vec<f64>>,
    test_labels: Vec<u8>,
    train_size: usize,
}

impl TrainedChurnModel {
    /// Positive-class probability for raw (unscaled) features
    pub fn predict_proba(&self, features: &ChurnFeatures) -> f64 {
        let scaled = self.scaler.transform_row(&features.as_row());
        self.classifier.predict_proba(&scaled)
    }

    pub fn train_size(&self) -> usize {
        self.train_size
    }

    pub fn test_size(&self) -> usize {
        self.test_labels.len()
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Accuracy, precision, recall, F1 and ROC-AUC on the held-out split
    pub fn evaluate(&self) -> ClassificationMetrics {
        let predictions: Vec<u8> = self
            .test_features
            .iter()
            .map(|row| self.classifier.predict(row))
            .collect();
        let scores: Vec<f64> = self
            .test_features
            .iter()
            .map(|row| self.classifier.predict_proba(row))
            .collect();
        ClassificationMetrics::compute(&self.test_labels, &predictions, &scores)
    }
}

/// Result of a training attempt
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingOutcome {
    Trained(TrainedChurnModel),
    /// Too few customers, or only one class in the training split. No fit was run.
    InsufficientData { customers: usize, reason: String },
}

impl TrainingOutcome {
    pub fn model(&self) -> Option<&TrainedChurnModel> {
        match self {
            Self::Trained(model) => Some(model),
            Self::InsufficientData { .. } => None,
        }
    }

    pub fn into_model(self) -> Option<TrainedChurnModel> {
        match self {
            Self::Trained(model) => Some(model),
            Self::InsufficientData { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct ChurnService {
    customers: CustomerRepository,
    config: ChurnConfig,
}

impl ChurnService {
    pub fn new(db: Arc<DatabaseConnection>, config: ChurnConfig) -> Self {
        Self {
            customers: CustomerRepository::new(db),
            config,
        }
    }

    /// Overwrite every customer's churn score with the heuristic. Returns the number updated.
    #[instrument(skip(self))]
    pub async fn generate_initial_churn_scores(&self, today: NaiveDate) -> Result<usize, ServiceError> {
        let customers = self.customers.find_all().await?;
        let total = customers.len();

        for customer in customers {
            let features = ChurnFeatures::for_customer(&customer, today);
            let score = heuristic_churn_score(&features, customer.spending_factor_f64());
            self.customers
                .update_churn_score(customer, to_stored_score(score))
                .await?;
        }

        counter!("bi_crm_churn.heuristic_scored", total as u64);
        info!(customers = total, "initial churn scores assigned");
        Ok(total)
    }

    /// Fit scaler and classifier on a seeded split of all customers
    #[instrument(skip(self))]
    pub async fn train_churn_model(&self, today: NaiveDate) -> Result<TrainingOutcome, ServiceError> {
        let customers = self.customers.find_all().await?;
        let n = customers.len();

        if n < self.config.min_customers {
            warn!(
                customers = n,
                required = self.config.min_customers,
                "not enough customer data to train the churn model"
            );
            return Ok(TrainingOutcome::InsufficientData {
                customers: n,
                reason: format!(
                    "{} customers available, at least {} required",
                    n, self.config.min_customers
                ),
            });
        }

        let rows: Vec<(Vec<f64>, u8)> = customers
            .iter()
            .map(|c| {
                (
                    ChurnFeatures::for_customer(c, today).as_row(),
                    churn_label(c, today),
                )
            })
            .collect();

        let split = train_test_split(&rows, self.config.test_fraction, self.config.seed);
        let (train_x, train_y): (Vec<Vec<f64>>, Vec<u8>) = split.train.into_iter().unzip();
        let (test_x, test_y): (Vec<Vec<f64>>, Vec<u8>) = split.test.into_iter().unzip();

        let positives = train_y.iter().filter(|&&y| y == 1).count();
        if positives == 0 || positives == train_y.len() {
            warn!(customers = n, "training split contains a single churn class");
            return Ok(TrainingOutcome::InsufficientData {
                customers: n,
                reason: "training split contains a single class".to_string(),
            });
        }

        let scaler = StandardScaler::fit(&train_x)?;
        let params = LogisticRegressionParams {
            c: self.config.inverse_regularization,
            learning_rate: self.config.learning_rate,
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
        };
        let classifier = LogisticRegression::fit(&scaler.transform(&train_x), &train_y, &params)?;

        info!(
            train = train_y.len(),
            test = test_y.len(),
            iterations = classifier.iterations(),
            converged = classifier.converged(),
            "churn model trained"
        );

        Ok(TrainingOutcome::Trained(TrainedChurnModel {
            test_features: scaler.transform(&test_x),
            test_labels: test_y,
            train_size: train_y.len(),
            scaler,
            classifier,
        }))
    }

    /// Held-out metrics of a trained model
    pub fn evaluate_churn_model(&self, model: &TrainedChurnModel) -> ClassificationMetrics {
        let metrics = model.evaluate();
        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            roc_auc = ?metrics.roc_auc,
            "churn model evaluated"
        );
        metrics
    }

    /// Replace every churn score with the model probability and log a prediction row
    #[instrument(skip(self, model))]
    pub async fn predict_and_update_churn(
        &self,
        model: &TrainedChurnModel,
        today: NaiveDate,
    ) -> Result<usize, ServiceError> {
        let customers = self.customers.find_all().await?;
        let total = customers.len();

        for customer in customers {
            let features = ChurnFeatures::for_customer(&customer, today);
            let probability = model.predict_proba(&features);
            let customer_id = customer.id;
            self.customers
                .update_churn_score(customer, to_stored_score(probability))
                .await?;
            self.customers
                .record_prediction(customer_id, probability)
                .await?;
        }

        counter!("bi_crm_churn.model_scored", total as u64);
        info!(customers = total, "churn scores updated from model");
        Ok(total)
    }

    /// Stored churn score of one customer
    #[instrument(skip(self))]
    pub async fn churn_score_for_customer(&self, id: Uuid) -> Result<Option<Decimal>, ServiceError> {
        let customer = self
            .customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;
        Ok(customer.churn_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn customer(registered: NaiveDate, last_purchase: Option<NaiveDate>, factor: Decimal) -> customer::Model {
        customer::Model {
            id: Uuid::new_v4(),
            first_name: "Test".into(),
            last_name: "Customer".into(),
            email: "test@example.com".into(),
            phone: None,
            registration_date: registered,
            last_purchase_date: last_purchase,
            churn_score: None,
            segment_id: None,
            spending_factor: factor,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_purchase_uses_a_year_gap() {
        let today = date(2025, 1, 1);
        let c = customer(date(2024, 12, 1), None, dec!(1.0));
        let features = ChurnFeatures::for_customer(&c, today);
        assert_eq!(features.tenure_days, 31);
        assert_eq!(features.last_purchase_gap_days, 365);
    }

    #[test_case(10, 0, 1.0, 0.0 ; "recent purchase")]
    #[test_case(99, 50, 1.0, 0.5 ; "half")]
    #[test_case(99, 50, 1.5, 0.75 ; "spending factor scales")]
    #[test_case(10, 365, 1.0, 1.0 ; "clamped high")]
    #[test_case(-1, 10, 1.0, 1.0 ; "zero denominator clamps")]
    #[test_case(-1, 0, 1.0, 0.0 ; "undefined scores zero")]
    #[test_case(5, -30, 1.0, 0.0 ; "clamped low")]
    fn heuristic(tenure: i64, gap: i64, factor: f64, expected: f64) {
        let features = ChurnFeatures {
            tenure_days: tenure,
            last_purchase_gap_days: gap,
        };
        assert!((heuristic_churn_score(&features, factor) - expected).abs() < 1e-12);
    }

    #[test]
    fn label_threshold_is_one_half() {
        assert_eq!(CHURN_LABEL_THRESHOLD, dec!(0.5));
    }

    #[test]
    fn stored_score_has_two_decimals() {
        assert_eq!(to_stored_score(0.123456), dec!(0.12));
        assert_eq!(to_stored_score(1.0), dec!(1.00));
    }

    #[test]
    fn labels_follow_the_heuristic() {
        let today = date(2025, 1, 1);
        let churner = customer(date(2024, 12, 1), None, dec!(1.0));
        let active = customer(date(2020, 1, 1), Some(date(2024, 12, 31)), dec!(1.0));
        assert_eq!(churn_label(&churner, today), 1);
        assert_eq!(churn_label(&active, today), 0);
    }
}
