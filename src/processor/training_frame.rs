//! Reduction of the merged table to a numeric features/target pair.

use crate::constants::MERGED_TABLE;
use crate::error::{PhytoError, Result};
use crate::models::{MergedFrame, RowAccounting, TaskMode, TrainingSet};
use crate::schema::require_columns;
use polars::prelude::*;
use tracing::{debug, warn};

const LABEL_COLUMN: &str = "__label";

/// Select features and target, derive the label and drop incomplete rows
///
/// In classification mode the label is `target > bloom_threshold` (strict),
/// encoded as 1.0 / 0.0. Rows with any missing or non-finite feature or
/// target value are dropped, never imputed; the returned accounting says how
/// many.
pub fn build_training_frame(
    merged: &MergedFrame,
    feature_names: &[String],
    target_name: &str,
    mode: TaskMode,
    bloom_threshold: f64,
) -> Result<(TrainingSet, RowAccounting)> {
    require_columns(
        merged.frame(),
        MERGED_TABLE,
        feature_names
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(target_name)),
    )?;
    if feature_names.is_empty() {
        return Err(PhytoError::invalid_input(MERGED_TABLE, "no features requested"));
    }

    let target = col(target_name).cast(DataType::Float64);
    let label = match mode {
        TaskMode::Classification => target.gt(lit(bloom_threshold)).cast(DataType::Float64),
        TaskMode::Regression => target,
    };

    let mut selection: Vec<Expr> = feature_names
        .iter()
        .map(|name| col(name.as_str()).cast(DataType::Float64).alias(name.as_str()))
        .collect();
    selection.push(label.alias(LABEL_COLUMN));

    let complete = merged
        .frame()
        .clone()
        .lazy()
        .select(selection)
        .drop_nulls(None)
        .collect()?;

    let mut features = vec![Vec::with_capacity(feature_names.len()); complete.height()];
    for name in feature_names {
        let values = complete.column(name)?.as_materialized_series().f64()?;
        for (row, value) in features.iter_mut().zip(values.into_iter()) {
            row.push(value.unwrap_or(f64::NAN));
        }
    }
    let labels: Vec<f64> = complete
        .column(LABEL_COLUMN)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();

    let (features, target): (Vec<Vec<f64>>, Vec<f64>) = features
        .into_iter()
        .zip(labels)
        .filter(|(row, label)| label.is_finite() && row.iter().all(|v| v.is_finite()))
        .unzip();

    let accounting = RowAccounting {
        merged_rows: merged.height(),
        retained_rows: target.len(),
        dropped_rows: merged.height() - target.len(),
    };

    if accounting.dropped_rows > 0 {
        warn!(
            "Dropped {} of {} merged rows with missing feature or target values",
            accounting.dropped_rows, accounting.merged_rows
        );
    }
    debug!(
        "Training frame ({}): {} rows x {} features",
        mode,
        accounting.retained_rows,
        feature_names.len()
    );

    Ok((
        TrainingSet::new(feature_names.to_vec(), features, target),
        accounting,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_bloom_label_is_strictly_greater() {
        let merged = MergedFrame::from_frame(
            df!(
                "Temperature" => &[75.0, 80.0, 70.0],
                "Phytoplankton (cells/ml)" => &[1500.0, 800.0, 1000.0]
            )
            .unwrap(),
        );

        let (set, accounting) = build_training_frame(
            &merged,
            &names(&["Temperature"]),
            "Phytoplankton (cells/ml)",
            TaskMode::Classification,
            1000.0,
        )
        .unwrap();

        assert_eq!(set.target, vec![1.0, 0.0, 0.0]);
        assert_eq!(set.features, vec![vec![75.0], vec![80.0], vec![70.0]]);
        assert_eq!(accounting.dropped_rows, 0);
    }

    #[test]
    fn test_regression_uses_raw_target() {
        let merged = MergedFrame::from_frame(
            df!(
                "Temperature" => &[75.0, 80.0],
                "Phytoplankton (cells/ml)" => &[1500.0, 800.0]
            )
            .unwrap(),
        );

        let (set, _) = build_training_frame(
            &merged,
            &names(&["Temperature"]),
            "Phytoplankton (cells/ml)",
            TaskMode::Regression,
            1000.0,
        )
        .unwrap();
        assert_eq!(set.target, vec![1500.0, 800.0]);
    }

    #[test]
    fn test_incomplete_rows_are_dropped_and_counted() {
        let merged = MergedFrame::from_frame(
            df!(
                "Temperature" => &[Some(75.0), None, Some(70.0), Some(f64::NAN)],
                "Wind" => &[Some(1), Some(2), Some(3), Some(4)],
                "Phytoplankton (cells/ml)" => &[Some("1500"), Some("900"), Some("abc"), Some("10")]
            )
            .unwrap(),
        );

        let (set, accounting) = build_training_frame(
            &merged,
            &names(&["Temperature", "Wind"]),
            "Phytoplankton (cells/ml)",
            TaskMode::Classification,
            1000.0,
        )
        .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.features, vec![vec![75.0, 1.0]]);
        assert_eq!(set.target, vec![1.0]);
        assert_eq!(
            accounting,
            RowAccounting {
                merged_rows: 4,
                retained_rows: 1,
                dropped_rows: 3,
            }
        );
    }

    #[test]
    fn test_absent_feature_is_schema_error() {
        let merged = MergedFrame::from_frame(
            df!("Temperature" => &[75.0], "Phytoplankton (cells/ml)" => &[1500.0]).unwrap(),
        );

        let result = build_training_frame(
            &merged,
            &names(&["Temperature", "Humidity"]),
            "Phytoplankton (cells/ml)",
            TaskMode::Classification,
            1000.0,
        );
        match result {
            Err(PhytoError::Schema { missing, .. }) => assert_eq!(missing, vec!["Humidity"]),
            other => panic!("expected schema error, got {other:?}"),
        }

        let result = build_training_frame(
            &merged,
            &names(&["Temperature"]),
            "Chlorophyll",
            TaskMode::Regression,
            1000.0,
        );
        assert!(matches!(result, Err(PhytoError::Schema { .. })));
    }
}
