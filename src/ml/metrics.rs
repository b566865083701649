use serde::{Deserialize, Serialize};

/// Held-out quality of a binary classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the labels contain a single class
    pub roc_auc: Option<f64>,
    pub support: usize,
}

impl ClassificationMetrics {
    /// Compute metrics from true labels, hard predictions and positive-class scores.
    ///
    /// Precision, recall and F1 are 0 when their denominator is 0.
    pub fn compute(y_true: &[u8], y_pred: &[u8], scores: &[f64]) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        let mut correct = 0usize;

        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            if truth == pred {
                correct += 1;
            }
            match (truth, pred) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                _ => {}
            }
        }

        let support = y_true.len().min(y_pred.len());
        let accuracy = ratio(correct, support);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1,
            roc_auc: roc_auc(y_true, scores),
            support,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(y_true.iter().copied()).collect();
    let positives = pairs.iter().filter(|(_, y)| *y == 1).count();
    let negatives = pairs.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < pairs.len() {
        let mut j = i;
        while j + 1 < pairs.len() && pairs[j + 1].0 == pairs[i].0 {
            j += 1;
        }
        // Ranks are 1-based; tied scores share the mean rank
        let mean_rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum += mean_rank * pairs[i..=j].iter().filter(|(_, y)| *y == 1).count() as f64;
        i = j + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Error of predictions against reference values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error as a fraction, over references > 0.
    /// `None` when no reference value is positive.
    pub mape: Option<f64>,
}

impl RegressionMetrics {
    /// Returns `None` for empty input
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return None;
        }

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut pct_count = 0usize;
        for (a, p) in actual.iter().zip(predicted) {
            let err = p - a;
            abs_sum += err.abs();
            sq_sum += err * err;
            if *a > 0.0 {
                pct_sum += err.abs() / a;
                pct_count += 1;
            }
        }

        let n = n as f64;
        Some(Self {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            mape: (pct_count > 0).then(|| pct_sum / pct_count as f64),
        })
    }
}
