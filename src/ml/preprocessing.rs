use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Rows partitioned into a training and a held-out part
#[derive(Debug, Clone)]
pub struct TrainTestSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffle `rows` with a seeded RNG and hold out `ceil(n * test_fraction)` of them.
///
/// The same seed and input order always produce the same split.
pub fn train_test_split<T: Clone>(rows: &[T], test_fraction: f64, seed: u64) -> TrainTestSplit<T> {
    let n = rows.len();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test_len = test_len.min(n);

    let (test_idx, train_idx) = indices.split_at(test_len);
    TrainTestSplit {
        train: train_idx.iter().map(|&i| rows[i].clone()).collect(),
        test: test_idx.iter().map(|&i| rows[i].clone()).collect(),
    }
}

/// Per-feature standardisation: `(x - mean) / std`.
///
/// Uses the population standard deviation; features with zero variance are
/// only centred (their scale is 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ServiceError> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| ServiceError::InvalidInput("cannot fit a scaler on zero rows".into()))?;
        if rows.iter().any(|row| row.len() != width) {
            return Err(ServiceError::InvalidInput(
                "all rows must have the same number of features".into(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in scale.iter_mut() {
            *s = s.sqrt();
            if !s.is_finite() || *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let rows: Vec<u32> = (0..25).collect();
        let a = train_test_split(&rows, 0.2, 42);
        let b = train_test_split(&rows, 0.2, 42);
        assert_eq!(a.test, b.test);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn holds_out_ceiling_of_fraction() {
        let rows: Vec<u32> = (0..11).collect();
        let split = train_test_split(&rows, 0.2, 7);
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);

        let mut all: Vec<u32> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, rows);
    }

    #[test]
    fn scaler_centres_and_scales() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        // Second column has zero variance
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform_row(&[3.0, 12.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn scaler_rejects_ragged_or_empty_input() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
