//! Per-feature standardization fitted on training rows only.

use crate::error::{PhytoError, Result};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std`, population standard deviation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and standard deviations
    ///
    /// A zero-variance column gets a scale of 1 so it maps to zero instead
    /// of dividing by zero.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(PhytoError::model("cannot fit scaler on zero rows"));
        };
        let n_features = first.len();
        if rows.iter().any(|row| row.len() != n_features) {
            return Err(PhytoError::model("ragged feature matrix"));
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; n_features];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value / n;
            }
        }

        let mut scales = vec![0.0; n_features];
        for row in rows {
            for ((scale, value), mean) in scales.iter_mut().zip(row).zip(&means) {
                *scale += (value - mean).powi(2) / n;
            }
        }
        for scale in scales.iter_mut() {
            *scale = scale.sqrt();
            if *scale == 0.0 {
                *scale = 1.0;
            }
        }

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.n_features() {
                    return Err(PhytoError::model(format!(
                        "scaler expects {} features, row has {}",
                        self.n_features(),
                        row.len()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(value, (mean, scale))| (value - mean) / scale)
                    .collect())
            })
            .collect()
    }
}
