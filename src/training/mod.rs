//! Model capability around the training set.
//!
//! Learning algorithms are opaque: a [`ModelBackend`] fits a
//! [`FittedModel`] from a [`TrainingSet`] and predicts from it. This module
//! provides the pieces every backend shares:
//!
//! - [`split`] - deterministic shuffled train/test split
//! - [`scaler`] - per-feature standardization fitted on training rows
//! - [`metrics`] - regression metrics and a classification report
//! - [`baseline`] - reference backends for running the pipeline end to end
//!
//! [`evaluate`] ties them together the way the prediction service does:
//! split, scale, fit on the training part, score on the held-out part.

pub mod baseline;
pub mod metrics;
pub mod scaler;
pub mod split;

pub use self::baseline::{MajorityBaseline, MeanBaseline};
pub use self::metrics::{ClassScores, ClassificationReport, RegressionMetrics};
pub use self::scaler::StandardScaler;
pub use self::split::train_test_split;

use crate::config::SplitConfig;
use crate::constants::{MERGED_TABLE, columns};
use crate::error::{PhytoError, Result};
use crate::models::{TaskMode, TrainingSet};
use crate::schema::require_columns;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// A learning algorithm the pipeline can hand its training set to
pub trait ModelBackend {
    fn name(&self) -> &str;

    fn fit(&self, set: &TrainingSet) -> Result<FittedModel>;

    fn predict(&self, model: &FittedModel, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Serializable fitted model, persisted by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub backend: String,
    pub mode: TaskMode,
    pub feature_names: Vec<String>,
    /// Backend-specific learned parameters
    pub parameters: Vec<f64>,
    /// Scaler applied to rows before they reach the backend
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub trained_at: DateTime<Utc>,
}

impl FittedModel {
    pub fn new(
        backend: impl Into<String>,
        mode: TaskMode,
        feature_names: Vec<String>,
        parameters: Vec<f64>,
    ) -> Self {
        Self {
            backend: backend.into(),
            mode,
            feature_names,
            parameters,
            scaler: None,
            trained_at: Utc::now(),
        }
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// The sole parameter of a one-number model produced by `backend`
    pub fn single_parameter(&self, backend: &str) -> Result<f64> {
        if self.backend != backend {
            return Err(PhytoError::model(format!(
                "model was fitted by '{}', not '{}'",
                self.backend, backend
            )));
        }
        match self.parameters.as_slice() {
            [value] => Ok(*value),
            other => Err(PhytoError::model(format!(
                "expected one parameter, found {}",
                other.len()
            ))),
        }
    }

    /// Every row must have one value per training feature
    pub fn check_rows(&self, rows: &[Vec<f64>]) -> Result<()> {
        let expected = self.feature_names.len();
        match rows.iter().position(|row| row.len() != expected) {
            Some(index) => Err(PhytoError::model(format!(
                "row {} has {} features, model expects {}",
                index,
                rows[index].len(),
                expected
            ))),
            None => Ok(()),
        }
    }

    /// Apply the stored scaler, if any
    pub fn prepare_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        match &self.scaler {
            Some(scaler) => scaler.transform(rows),
            None => Ok(rows.to_vec()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        debug!("Saved {} model to {}", self.backend, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PhytoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Held-out scores, shaped by the task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    Regression(RegressionMetrics),
    Classification(ClassificationReport),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Regression(metrics) => write!(f, "{metrics}"),
            Evaluation::Classification(report) => write!(f, "{report}"),
        }
    }
}

/// Result of [`evaluate`]
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: FittedModel,
    pub evaluation: Evaluation,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Reference backend for a task
pub fn baseline_for(mode: TaskMode) -> Box<dyn ModelBackend> {
    match mode {
        TaskMode::Classification => Box::new(MajorityBaseline),
        TaskMode::Regression => Box::new(MeanBaseline),
    }
}

/// Backend that fitted a persisted model, looked up by its stored name
pub fn backend_named(name: &str) -> Result<Box<dyn ModelBackend>> {
    match name {
        MeanBaseline::NAME => Ok(Box::new(MeanBaseline)),
        MajorityBaseline::NAME => Ok(Box::new(MajorityBaseline)),
        other => Err(PhytoError::model(format!("unknown model backend '{other}'"))),
    }
}

/// Split, standardize, fit on the training part and score on the test part
pub fn evaluate(
    backend: &dyn ModelBackend,
    set: &TrainingSet,
    mode: TaskMode,
    split: &SplitConfig,
) -> Result<TrainingOutcome> {
    let (train, test) = train_test_split(set, split.test_fraction, split.seed)?;

    let scaler = StandardScaler::fit(&train.features)?;
    let scaled_train = TrainingSet::new(
        train.feature_names.clone(),
        scaler.transform(&train.features)?,
        train.target.clone(),
    );

    let model = backend.fit(&scaled_train)?.with_scaler(scaler);
    let predictions = backend.predict(&model, &model.prepare_rows(&test.features)?)?;

    let evaluation = match mode {
        TaskMode::Regression => {
            Evaluation::Regression(RegressionMetrics::compute(&test.target, &predictions)?)
        }
        TaskMode::Classification => {
            Evaluation::Classification(ClassificationReport::compute(&test.target, &predictions)?)
        }
    };

    info!(
        "Evaluated {} on {} held-out rows ({} training rows)",
        backend.name(),
        test.len(),
        train.len()
    );

    Ok(TrainingOutcome {
        model,
        evaluation,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}

/// Predict raw (unscaled) rows with a persisted model
pub fn predict(backend: &dyn ModelBackend, model: &FittedModel, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
    model.check_rows(rows)?;
    backend.predict(model, &model.prepare_rows(rows)?)
}

/// Append a `Prediction` column to `frame`
///
/// Every model feature must be a column of `frame`. Rows with a missing or
/// non-finite feature value get a null prediction; the row count is unchanged.
pub fn predict_frame(backend: &dyn ModelBackend, model: &FittedModel, frame: &DataFrame) -> Result<DataFrame> {
    require_columns(frame, MERGED_TABLE, model.feature_names.iter().map(String::as_str))?;

    let features = frame
        .clone()
        .lazy()
        .select(
            model
                .feature_names
                .iter()
                .map(|name| col(name.as_str()).cast(DataType::Float64).alias(name.as_str()))
                .collect::<Vec<_>>(),
        )
        .collect()?;
    let feature_columns = model
        .feature_names
        .iter()
        .map(|name| features.column(name)?.as_materialized_series().f64())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut complete_rows = Vec::new();
    let mut row_indices = Vec::new();
    for index in 0..features.height() {
        let row: Option<Vec<f64>> = feature_columns
            .iter()
            .map(|values| values.get(index).filter(|v| v.is_finite()))
            .collect();
        if let Some(row) = row {
            complete_rows.push(row);
            row_indices.push(index);
        }
    }

    let mut predictions: Vec<Option<f64>> = vec![None; frame.height()];
    for (index, value) in row_indices
        .into_iter()
        .zip(predict(backend, model, &complete_rows)?)
    {
        predictions[index] = Some(value);
    }
    debug!(
        "Predicted {} of {} rows with {}",
        complete_rows.len(),
        frame.height(),
        model.backend
    );

    let mut out = frame.clone();
    out.with_column(Series::new(columns::PREDICTION.into(), predictions))?;
    Ok(out)
}
