//! Cell-level cleaning for the two raw tables.
//!
//! Cleaning is expressed as polars expressions built from configuration:
//! one numeric coercion applied to every non-excluded weather column, two
//! closed vocabularies (Wind, Condition) and one month correction table.
//! Nothing here drops rows; a dirty cell becomes a missing value.

use crate::config::{MonthCorrections, PipelineConfig, Vocabulary};
use crate::constants::{GROUPING_SEPARATOR, NON_NUMERIC_PATTERN, WATER_QUALITY_TABLE, WEATHER_TABLE};
use crate::error::Result;
use crate::models::{WaterQualityFrame, WeatherFrame};
use crate::schema::{column_names, has_column, is_text_column, require_columns};
use polars::prelude::*;
use tracing::debug;

/// Parse phytoplankton counts and normalize month names
pub fn clean_water_quality(raw: DataFrame, config: &PipelineConfig) -> Result<WaterQualityFrame> {
    let month = config.month_column.as_str();
    let phytoplankton = config.phytoplankton_column.as_str();
    require_columns(&raw, WATER_QUALITY_TABLE, [month, phytoplankton])?;

    let rows = raw.height();
    let density = if is_text_column(&raw, phytoplankton)? {
        parse_grouped_number(col(phytoplankton))
    } else {
        col(phytoplankton).cast(DataType::Float64)
    };

    let cleaned = raw
        .lazy()
        .with_columns([
            density.alias(phytoplankton),
            normalize_month(col(month), &config.month_corrections).alias(month),
        ])
        .collect()?;

    debug_assert_eq!(cleaned.height(), rows);
    debug!("Cleaned {} table: {} rows", WATER_QUALITY_TABLE, rows);
    Ok(WaterQualityFrame::from_frame(cleaned))
}

/// Coerce numeric-ish weather columns and code Wind/Condition
pub fn clean_weather(raw: DataFrame, config: &PipelineConfig) -> Result<WeatherFrame> {
    let year = config.year_column.as_str();
    let month = config.month_column.as_str();
    require_columns(&raw, WEATHER_TABLE, [year, month])?;

    let rows = raw.height();
    let mut exprs = Vec::new();

    for name in column_names(&raw) {
        if config.is_excluded_weather_column(&name) {
            continue;
        }
        let coerced = if is_text_column(&raw, &name)? {
            strip_non_numeric(col(name.as_str()))
        } else {
            col(name.as_str()).cast(DataType::Float64)
        };
        exprs.push(coerced.alias(name.as_str()));
    }

    exprs.push(normalize_month(col(month), &config.month_corrections).alias(month));

    for (column, vocabulary) in [
        (config.wind_column.as_str(), &config.wind_codes),
        (config.condition_column.as_str(), &config.condition_codes),
    ] {
        if !has_column(&raw, column) {
            debug!("Weather table has no '{}' column; skipping coding", column);
        } else if is_text_column(&raw, column)? {
            exprs.push(vocabulary_codes(col(column), vocabulary).alias(column));
        } else {
            exprs.push(known_codes(col(column), vocabulary).alias(column));
        }
    }

    let cleaned = raw.lazy().with_columns(exprs).collect()?;

    debug_assert_eq!(cleaned.height(), rows);
    debug!("Cleaned {} table: {} rows", WEATHER_TABLE, rows);
    Ok(WeatherFrame::from_frame(cleaned))
}

/// "1,234" -> 1234.0; unparseable -> null
pub fn parse_grouped_number(expr: Expr) -> Expr {
    expr.cast(DataType::String)
        .str()
        .replace_all(lit(GROUPING_SEPARATOR), lit(""), true)
        .str()
        .strip_chars(lit(NULL))
        .cast(DataType::Float64)
}

/// "75F" -> 75.0, "29.8 in" -> 29.8; nothing numeric left -> null
pub fn strip_non_numeric(expr: Expr) -> Expr {
    expr.cast(DataType::String)
        .str()
        .replace_all(lit(NON_NUMERIC_PATTERN), lit(""), false)
        .cast(DataType::Float64)
}

/// Apply the correction table; unknown spellings pass through
pub fn normalize_month(expr: Expr, corrections: &MonthCorrections) -> Expr {
    let month = expr.cast(DataType::String).str().strip_chars(lit(NULL));
    corrections.iter().fold(month.clone(), |acc, (from, to)| {
        when(month.clone().eq(lit(from)))
            .then(lit(to))
            .otherwise(acc)
    })
}

/// Map text labels to Int32 codes; anything outside the table -> null
pub fn vocabulary_codes(expr: Expr, vocabulary: &Vocabulary) -> Expr {
    let label = expr.cast(DataType::String).str().strip_chars(lit(NULL));
    vocabulary
        .iter()
        .fold(lit(NULL).cast(DataType::Int32), |acc, (name, code)| {
            when(label.clone().eq(lit(name)))
                .then(lit(code))
                .otherwise(acc)
        })
        .cast(DataType::Int32)
}

/// Keep numeric values that are codes of the table; anything else -> null
pub fn known_codes(expr: Expr, vocabulary: &Vocabulary) -> Expr {
    let value = expr.cast(DataType::Float64);
    vocabulary
        .iter()
        .fold(lit(NULL).cast(DataType::Int32), |acc, (_, code)| {
            when(value.clone().eq(lit(code as f64)))
                .then(lit(code))
                .otherwise(acc)
        })
        .cast(DataType::Int32)
}
