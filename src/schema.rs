//! Column presence checks and join-key normalization.
//!
//! Raw tables are read with every column as a string, so the pipeline is the
//! only place column types are decided. The helpers here keep the key
//! columns (Year, Month) typed identically on both sides of every join.

use crate::error::{PhytoError, Result};
use polars::prelude::*;

/// Column names of a frame, in frame order
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Fail with a schema error naming every required column that is absent
pub fn require_columns<'a>(
    frame: &DataFrame,
    table: &str,
    required: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let missing: Vec<String> = required
        .into_iter()
        .filter(|name| !has_column(frame, name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PhytoError::Schema {
            table: table.to_string(),
            missing,
        })
    }
}

/// True when the column is stored as text and needs string-level cleaning
pub fn is_text_column(frame: &DataFrame, name: &str) -> Result<bool> {
    Ok(matches!(frame.column(name)?.dtype(), DataType::String))
}

/// Integer year key; accepts "2021", 2021.0 or 2021
pub fn year_key(name: &str) -> Expr {
    col(name)
        .cast(DataType::Float64)
        .cast(DataType::Int64)
        .alias(name)
}

/// Trimmed string month key
pub fn month_key(name: &str) -> Expr {
    col(name)
        .cast(DataType::String)
        .str()
        .strip_chars(lit(NULL))
        .alias(name)
}
