//! Reference backends that need no ML library.

use super::{FittedModel, ModelBackend};
use crate::error::{PhytoError, Result};
use crate::models::{TaskMode, TrainingSet};
use std::collections::BTreeMap;

/// Predicts the training-set mean of the target
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanBaseline;

impl MeanBaseline {
    pub const NAME: &'static str = "mean-baseline";
}

impl ModelBackend for MeanBaseline {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&self, set: &TrainingSet) -> Result<FittedModel> {
        if set.is_empty() {
            return Err(PhytoError::model("cannot fit on an empty training set"));
        }
        let mean = set.target.iter().sum::<f64>() / set.len() as f64;
        Ok(FittedModel::new(
            Self::NAME,
            TaskMode::Regression,
            set.feature_names.clone(),
            vec![mean],
        ))
    }

    fn predict(&self, model: &FittedModel, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let mean = model.single_parameter(Self::NAME)?;
        model.check_rows(rows)?;
        Ok(vec![mean; rows.len()])
    }
}

/// Predicts the most frequent training label; ties go to the smaller label
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityBaseline;

impl MajorityBaseline {
    pub const NAME: &'static str = "majority-baseline";
}

impl ModelBackend for MajorityBaseline {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(&self, set: &TrainingSet) -> Result<FittedModel> {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for label in &set.target {
            *counts.entry(label.round() as i64).or_default() += 1;
        }

        let majority = counts
            .iter()
            .fold(None, |best: Option<(i64, usize)>, (&label, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label)
            .ok_or_else(|| PhytoError::model("cannot fit on an empty training set"))?;

        Ok(FittedModel::new(
            Self::NAME,
            TaskMode::Classification,
            set.feature_names.clone(),
            vec![majority as f64],
        ))
    }

    fn predict(&self, model: &FittedModel, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let label = model.single_parameter(Self::NAME)?;
        model.check_rows(rows)?;
        Ok(vec![label; rows.len()])
    }
}
