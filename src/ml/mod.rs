/*!
 * # Machine Learning Module
 *
 * Small, dependency-free models used by the churn and forecasting services:
 *
 * - feature standardisation and a seeded train/test split
 * - binary logistic regression with L2 regularisation
 * - classification and regression metrics
 * - a lexicon-based sentiment analyser for free-text reviews
 */

pub mod logistic;
pub mod metrics;
pub mod preprocessing;
pub mod sentiment;

pub use logistic::{LogisticRegression, LogisticRegressionParams};
pub use metrics::{ClassificationMetrics, RegressionMetrics};
pub use preprocessing::{train_test_split, StandardScaler, TrainTestSplit};
pub use sentiment::SentimentAnalyzer;
