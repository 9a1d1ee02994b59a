//! Core data structures for the merge-and-clean pipeline.
//!
//! Each pipeline stage produces its own frame type so stages can only be
//! chained in order: raw tables are cleaned, weather is aggregated, the two
//! are merged, and the merge is reduced to a [`TrainingSet`].

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supervised learning task the training frame is built for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Binary bloom / non-bloom label derived from the bloom threshold
    #[default]
    Classification,
    /// Raw phytoplankton density
    Regression,
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskMode::Classification => write!(f, "classification"),
            TaskMode::Regression => write!(f, "regression"),
        }
    }
}

impl FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classification" => Ok(TaskMode::Classification),
            "regression" => Ok(TaskMode::Regression),
            other => Err(format!("unknown task mode: {other}")),
        }
    }
}

macro_rules! stage_frame {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(DataFrame);

        impl $name {
            /// Wrap a frame that already satisfies this stage's invariants
            pub fn from_frame(frame: DataFrame) -> Self {
                Self(frame)
            }

            pub fn frame(&self) -> &DataFrame {
                &self.0
            }

            pub fn into_inner(self) -> DataFrame {
                self.0
            }

            pub fn height(&self) -> usize {
                self.0.height()
            }
        }
    };
}

stage_frame!(
    /// Water-quality table with numeric phytoplankton and canonical months
    WaterQualityFrame
);
stage_frame!(
    /// Weather table with every non-excluded column numeric and Wind/Condition coded
    WeatherFrame
);
stage_frame!(
    /// One row per (Year, Month[, context]) weather group
    MonthlyWeather
);
stage_frame!(
    /// Inner join of water quality and monthly weather
    MergedFrame
);

/// Fully numeric, row-aligned features and target
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSet {
    pub feature_names: Vec<String>,
    /// Row-major feature matrix
    pub features: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl TrainingSet {
    pub fn new(feature_names: Vec<String>, features: Vec<Vec<f64>>, target: Vec<f64>) -> Self {
        Self {
            feature_names,
            features,
            target,
        }
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Copy the given rows, in the given order, into a new set
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
        }
    }

    /// Values of a single named feature, if present
    pub fn feature_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.feature_names.iter().position(|n| n == name)?;
        Some(self.features.iter().map(|row| row[index]).collect())
    }
}

/// Row counts before and after dropping incomplete rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowAccounting {
    pub merged_rows: usize,
    pub retained_rows: usize,
    pub dropped_rows: usize,
}

/// Processing statistics for one pipeline invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub water_rows: usize,
    pub weather_rows: usize,
    pub monthly_groups: usize,
    pub merged_rows: usize,
    pub retained_rows: usize,
    pub dropped_rows: usize,
    pub processing_time_ms: u128,
}

impl PipelineStats {
    /// Water-quality rows that found no weather context
    pub fn unmatched_rows(&self) -> usize {
        self.water_rows.saturating_sub(self.merged_rows)
    }
}
