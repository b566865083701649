use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;

/// Hyper-parameters for [`LogisticRegression::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Inverse L2 regularisation strength; smaller values regularise more
    pub c: f64,
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Stop once every gradient component is below this magnitude
    pub tolerance: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iterations: 5_000,
            tolerance: 1e-6,
        }
    }
}

/// Binary logistic regression fitted by batch gradient descent.
///
/// Minimises the mean log-loss plus `||w||² / (2·C·n)`; the intercept is not
/// regularised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    iterations: usize,
    converged: bool,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    /// Fit on feature rows `x` with labels `y` in {0, 1}
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        params: &LogisticRegressionParams,
    ) -> Result<Self, ServiceError> {
        if x.is_empty() {
            return Err(ServiceError::InvalidInput(
                "cannot fit a classifier on zero rows".into(),
            ));
        }
        if x.len() != y.len() {
            return Err(ServiceError::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(ServiceError::InvalidInput("labels must be 0 or 1".into()));
        }
        if params.c <= 0.0 || params.learning_rate <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "C and learning rate must be positive".into(),
            ));
        }

        let width = x[0].len();
        if x.iter().any(|row| row.len() != width) {
            return Err(ServiceError::InvalidInput(
                "all rows must have the same number of features".into(),
            ));
        }

        let n = x.len() as f64;
        let mut model = Self {
            weights: vec![0.0; width],
            intercept: 0.0,
            iterations: 0,
            converged: false,
        };

        for iteration in 1..=params.max_iterations {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let error = model.predict_proba(row) - f64::from(label);
                for (g, xi) in grad_w.iter_mut().zip(row) {
                    *g += error * xi / n;
                }
                grad_b += error / n;
            }
            for (g, w) in grad_w.iter_mut().zip(&model.weights) {
                *g += w / (params.c * n);
            }

            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * g;
            }
            model.intercept -= params.learning_rate * grad_b;
            model.iterations = iteration;

            let max_grad = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if max_grad < params.tolerance {
                model.converged = true;
                break;
            }
        }

        debug!(
            iterations = model.iterations,
            converged = model.converged,
            "logistic regression fitted"
        );
        Ok(model)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let z = self
            .weights
            .iter()
            .zip(row)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        sigmoid(z)
    }

    /// Hard label at the 0.5 threshold
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let x = vec![
            vec![-2.0],
            vec![-1.5],
            vec![-1.0],
            vec![-0.5],
            vec![0.5],
            vec![1.0],
            vec![1.5],
            vec![2.0],
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(1_000.0) <= 1.0);
        assert!(sigmoid(-1_000.0) >= 0.0);
        assert!(sigmoid(-1_000.0).is_finite());
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticRegressionParams::default()).unwrap();

        assert!(model.weights()[0] > 0.0);
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row), label);
        }
        assert!(model.predict_proba(&[3.0]) > 0.9);
        assert!(model.predict_proba(&[-3.0]) < 0.1);
    }

    #[test]
    fn stronger_regularisation_shrinks_weights() {
        let (x, y) = separable();
        let loose = LogisticRegression::fit(&x, &y, &LogisticRegressionParams::default()).unwrap();
        let tight = LogisticRegression::fit(
            &x,
            &y,
            &LogisticRegressionParams {
                c: 0.01,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(tight.weights()[0].abs() < loose.weights()[0].abs());
    }

    #[test]
    fn rejects_mismatched_labels() {
        let err = LogisticRegression::fit(
            &[vec![1.0], vec![2.0]],
            &[1],
            &LogisticRegressionParams::default(),
        );
        assert!(err.is_err());
    }
}
