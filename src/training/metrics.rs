//! Evaluation metrics for held-out predictions.
//!
//! Regression reports MSE, MAE and R²; classification reports per-class
//! precision, recall, F1 and support plus overall accuracy. Both render as
//! plain text for the CLI summary.

use crate::error::{PhytoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub mae: f64,
    /// Coefficient of determination; 0 when the truth is constant and matched
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(truth: &[f64], predicted: &[f64]) -> Result<Self> {
        check_lengths(truth, predicted)?;
        let n = truth.len() as f64;

        let mse = truth
            .iter()
            .zip(predicted)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n;
        let mae = truth
            .iter()
            .zip(predicted)
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n;

        let mean = truth.iter().sum::<f64>() / n;
        let total = truth.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
        let residual = mse * n;
        let r2 = if total == 0.0 {
            if residual == 0.0 { 1.0 } else { 0.0 }
        } else {
            1.0 - residual / total
        };

        Ok(Self { mse, mae, r2 })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean Squared Error: {:.4}", self.mse)?;
        writeln!(f, "Mean Absolute Error: {:.4}", self.mae)?;
        write!(f, "R2 Score: {:.4}", self.r2)
    }
}

/// Scores for a single class label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Keyed by integer class label, ascending
    pub classes: BTreeMap<i64, ClassScores>,
    pub accuracy: f64,
    pub total: usize,
}

impl ClassificationReport {
    /// Labels are compared after rounding to the nearest integer
    pub fn compute(truth: &[f64], predicted: &[f64]) -> Result<Self> {
        check_lengths(truth, predicted)?;

        let truth: Vec<i64> = truth.iter().map(|v| v.round() as i64).collect();
        let predicted: Vec<i64> = predicted.iter().map(|v| v.round() as i64).collect();

        let mut labels: Vec<i64> = truth.iter().chain(&predicted).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let mut classes = BTreeMap::new();
        for label in labels {
            let true_positive = truth
                .iter()
                .zip(&predicted)
                .filter(|(t, p)| **t == label && **p == label)
                .count();
            let support = truth.iter().filter(|t| **t == label).count();
            let predicted_count = predicted.iter().filter(|p| **p == label).count();

            let precision = ratio(true_positive, predicted_count);
            let recall = ratio(true_positive, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };

            classes.insert(
                label,
                ClassScores {
                    precision,
                    recall,
                    f1,
                    support,
                },
            );
        }

        let correct = truth.iter().zip(&predicted).filter(|(t, p)| t == p).count();
        Ok(Self {
            classes,
            accuracy: ratio(correct, truth.len()),
            total: truth.len(),
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>8} {:>10} {:>10} {:>10} {:>10}",
            "class", "precision", "recall", "f1-score", "support"
        )?;
        for (label, scores) in &self.classes {
            writeln!(
                f,
                "{:>8} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, scores.precision, scores.recall, scores.f1, scores.support
            )?;
        }
        write!(
            f,
            "{:>8} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn check_lengths(truth: &[f64], predicted: &[f64]) -> Result<()> {
    if truth.is_empty() {
        return Err(PhytoError::model("cannot evaluate on zero rows"));
    }
    if truth.len() != predicted.len() {
        return Err(PhytoError::model(format!(
            "{} true values but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    Ok(())
}
