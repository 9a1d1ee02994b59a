//! Per-station time-series glue for the forecast service.
//!
//! Water-quality parameters that cannot be measured for a future date are
//! forecast from each station's monthly history. The forecasting model is
//! opaque ([`Forecaster`]); this module extracts the series, computes how
//! many monthly steps lie between the last observation and the target date
//! and picks the forecast for that date.

use crate::config::{ForecastConfig, PipelineConfig};
use crate::constants::{MERGED_TABLE, month_number};
use crate::error::{PhytoError, Result};
use crate::models::MergedFrame;
use crate::schema::{month_key, require_columns, year_key};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// A univariate monthly forecasting model
pub trait Forecaster {
    /// Forecast the `steps` values following `series`
    fn forecast(&self, series: &[f64], steps: usize) -> Result<Vec<f64>>;
}

/// Repeats the value observed one season earlier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalNaive {
    season_length: usize,
}

impl SeasonalNaive {
    pub fn new(season_length: usize) -> Result<Self> {
        if season_length == 0 {
            return Err(PhytoError::forecast("season length must be positive"));
        }
        Ok(Self { season_length })
    }

    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        Self::new(config.season_length())
    }
}

impl Forecaster for SeasonalNaive {
    fn forecast(&self, series: &[f64], steps: usize) -> Result<Vec<f64>> {
        let Some(&last) = series.last() else {
            return Err(PhytoError::forecast("cannot forecast an empty series"));
        };
        let n = series.len();
        let season = self.season_length;

        // Shorter than one season: fall back to the last observation
        if n < season {
            return Ok(vec![last; steps]);
        }
        Ok((0..steps).map(|h| series[n - season + h % season]).collect())
    }
}

/// Whole months from `last_observed` to `target`; the target must be later
pub fn forecast_horizon(last_observed: NaiveDate, target: NaiveDate) -> Result<usize> {
    let months = (target.year() - last_observed.year()) as i64 * 12
        + (target.month() as i64 - last_observed.month() as i64);
    if months <= 0 {
        return Err(PhytoError::forecast(format!(
            "target {target} is not after the last observation {last_observed}"
        )));
    }
    Ok(months as usize)
}

/// Chronological, non-missing (month, value) series for one station
///
/// Rows whose month name is not a canonical English month are skipped.
pub fn station_series(
    merged: &MergedFrame,
    config: &PipelineConfig,
    station: &str,
    parameter: &str,
) -> Result<Vec<(NaiveDate, f64)>> {
    let station_column = config
        .context_column
        .as_deref()
        .ok_or_else(|| PhytoError::configuration("no station column configured"))?;
    let year = config.year_column.as_str();
    let month = config.month_column.as_str();
    require_columns(merged.frame(), MERGED_TABLE, [station_column, year, month, parameter])?;

    let rows = merged
        .frame()
        .clone()
        .lazy()
        .filter(
            col(station_column)
                .cast(DataType::String)
                .str()
                .strip_chars(lit(NULL))
                .eq(lit(station)),
        )
        .select([
            year_key(year),
            month_key(month),
            col(parameter).cast(DataType::Float64).alias(parameter),
        ])
        .drop_nulls(None)
        .collect()?;

    let years = rows.column(year)?.as_materialized_series().i64()?;
    let months = rows.column(month)?.as_materialized_series().str()?;
    let values = rows.column(parameter)?.as_materialized_series().f64()?;

    let mut series: Vec<(NaiveDate, f64)> = years
        .into_iter()
        .zip(months.into_iter())
        .zip(values.into_iter())
        .filter_map(|((y, m), v)| {
            let date = NaiveDate::from_ymd_opt(i32::try_from(y?).ok()?, month_number(m?)?, 1)?;
            v.filter(|v| v.is_finite()).map(|v| (date, v))
        })
        .collect();
    series.sort_by_key(|(date, _)| *date);

    debug!(
        "Series for {} / {}: {} observations",
        station,
        parameter,
        series.len()
    );
    Ok(series)
}

/// Forecast every configured parameter for one station at `target`
pub fn forecast_station_inputs(
    forecaster: &dyn Forecaster,
    merged: &MergedFrame,
    config: &PipelineConfig,
    station: &str,
    target: NaiveDate,
) -> Result<BTreeMap<String, f64>> {
    let mut inputs = BTreeMap::new();
    for parameter in &config.forecast.parameters {
        let value = forecast_value(forecaster, merged, config, station, parameter, target)?;
        inputs.insert(parameter.clone(), value);
    }
    Ok(inputs)
}

/// One model input row for a station at `target`, in `features` order
///
/// Every feature, weather readings included, is forecast from the station's
/// merged history.
pub fn forecast_feature_row(
    forecaster: &dyn Forecaster,
    merged: &MergedFrame,
    config: &PipelineConfig,
    station: &str,
    target: NaiveDate,
    features: &[String],
) -> Result<Vec<f64>> {
    features
        .iter()
        .map(|feature| forecast_value(forecaster, merged, config, station, feature, target))
        .collect()
}

fn forecast_value(
    forecaster: &dyn Forecaster,
    merged: &MergedFrame,
    config: &PipelineConfig,
    station: &str,
    parameter: &str,
    target: NaiveDate,
) -> Result<f64> {
    let series = station_series(merged, config, station, parameter)?;
    let Some(&(last_observed, _)) = series.last() else {
        return Err(PhytoError::forecast(format!(
            "no observations of '{parameter}' at {station}"
        )));
    };

    let steps = forecast_horizon(last_observed, target)?;
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let forecast = forecaster.forecast(&values, steps)?;
    forecast.last().copied().ok_or_else(|| {
        PhytoError::forecast(format!("empty forecast for '{parameter}' at {station}"))
    })
}
