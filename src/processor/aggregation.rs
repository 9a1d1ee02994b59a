//! Monthly aggregation of cleaned weather observations.
//!
//! Coded categorical columns (Wind, Condition) reduce to their mode, every
//! other numeric column to its mean. Missing values are ignored within a
//! group; a group with no observed value yields a missing aggregate.

use crate::config::PipelineConfig;
use crate::constants::MONTHLY_WEATHER_TABLE;
use crate::error::Result;
use crate::models::{MonthlyWeather, WeatherFrame};
use crate::schema::{column_names, has_column, month_key, year_key};
use polars::prelude::*;
use tracing::debug;

const MODE_COUNT: &str = "__mode_count";

/// One row per distinct (Year, Month[, context]) group
pub fn aggregate_monthly(weather: &WeatherFrame, config: &PipelineConfig) -> Result<MonthlyWeather> {
    aggregate_monthly_with(weather, config, true)
}

/// As [`aggregate_monthly`], grouping by the context column only when
/// `group_by_context` is set
///
/// When the water-quality side has no context column the weather must be
/// reduced to one row per (Year, Month), otherwise each sample would join
/// several weather rows. The context column is then dropped from the output.
pub fn aggregate_monthly_with(
    weather: &WeatherFrame,
    config: &PipelineConfig,
    group_by_context: bool,
) -> Result<MonthlyWeather> {
    let frame = weather.frame();
    let names = column_names(frame);
    let year = config.year_column.as_str();
    let month = config.month_column.as_str();

    let keys = group_keys(frame, config, group_by_context);
    let key_exprs = || keys.iter().map(|k| col(k.as_str())).collect::<Vec<_>>();

    let categorical: Vec<&str> = [config.wind_column.as_str(), config.condition_column.as_str()]
        .into_iter()
        .filter(|name| has_column(frame, name))
        .collect();

    let numeric: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !keys.iter().any(|k| k.as_str() == *name))
        .filter(|name| !categorical.contains(name))
        .filter(|name| !config.is_excluded_weather_column(name))
        .collect();

    let base = frame
        .clone()
        .lazy()
        .with_columns([year_key(year), month_key(month)])
        .filter(col(year).is_not_null().and(col(month).is_not_null()));

    let means: Vec<Expr> = numeric
        .iter()
        .map(|name| col(*name).cast(DataType::Float64).mean().alias(*name))
        .collect();

    let mut monthly = base.clone().group_by(key_exprs()).agg(means);

    for name in &categorical {
        let modes = mode_per_group(base.clone(), key_exprs(), name);
        monthly = monthly.join(
            modes,
            key_exprs(),
            key_exprs(),
            JoinArgs::new(JoinType::Left),
        );
    }

    let output_columns: Vec<Expr> = names
        .iter()
        .filter(|name| {
            keys.contains(name)
                || categorical.contains(&name.as_str())
                || numeric.contains(&name.as_str())
        })
        .map(|name| col(name.as_str()))
        .collect();

    let aggregated = monthly
        .select(output_columns)
        .sort_by_exprs(key_exprs(), SortMultipleOptions::default())
        .collect()?;

    debug!(
        "Aggregated {} weather rows into {} {} groups (mode: {:?}, mean: {} columns)",
        frame.height(),
        aggregated.height(),
        MONTHLY_WEATHER_TABLE,
        categorical,
        numeric.len()
    );

    Ok(MonthlyWeather::from_frame(aggregated))
}

/// Year, Month and, when requested and the weather table carries it, the context column
fn group_keys(frame: &DataFrame, config: &PipelineConfig, group_by_context: bool) -> Vec<String> {
    let mut keys = vec![config.year_column.clone(), config.month_column.clone()];
    if let Some(context) = config.context_column.as_ref().filter(|_| group_by_context) {
        if has_column(frame, context) {
            keys.push(context.clone());
        }
    }
    keys
}

/// Most frequent non-missing code per group; ties go to the smallest code
fn mode_per_group(frame: LazyFrame, keys: Vec<Expr>, column: &str) -> LazyFrame {
    let mut count_keys = keys.clone();
    count_keys.push(col(column));

    frame
        .filter(col(column).is_not_null())
        .group_by(count_keys)
        .agg([len().alias(MODE_COUNT)])
        .group_by(keys)
        .agg([col(column)
            .sort_by(
                [col(MODE_COUNT), col(column)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .first()
            .alias(column)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::cleaning::clean_weather;
    use crate::reader::read_table;

    fn monthly(csv: &str) -> DataFrame {
        let config = PipelineConfig::default();
        let raw = read_table(csv.as_bytes(), "weather").unwrap();
        let weather = clean_weather(raw, &config).unwrap();
        aggregate_monthly(&weather, &config).unwrap().into_inner()
    }

    #[test]
    fn test_mode_of_wind() {
        let out = monthly(
            "Year,Month,Temperature,Wind,Condition\n\
             2021,March,70,N,Fair\n\
             2021,March,72,N,Rain\n\
             2021,March,74,E,Rain\n",
        );
        assert_eq!(out.height(), 1);
        let wind = out.column("Wind").unwrap().as_materialized_series().i32().unwrap().get(0);
        assert_eq!(wind, Some(1));
        let condition = out
            .column("Condition")
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .get(0);
        assert_eq!(condition, Some(7));
        let temperature = out
            .column("Temperature")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0);
        assert_eq!(temperature, Some(72.0));
    }

    #[test]
    fn test_mode_tie_takes_smallest_code() {
        let out = monthly(
            "Year,Month,Wind\n\
             2021,March,E\n\
             2021,March,N\n\
             2021,March,bogus\n",
        );
        let wind = out.column("Wind").unwrap().as_materialized_series().i32().unwrap().get(0);
        assert_eq!(wind, Some(1));
    }

    #[test]
    fn test_all_missing_yields_missing_aggregate() {
        let out = monthly(
            "Year,Month,Temperature,Humidity,Wind\n\
             2021,March,,80%,bogus\n\
             2021,March,n/a,60%,\n",
        );
        assert_eq!(out.height(), 1);
        assert_eq!(out.column("Temperature").unwrap().null_count(), 1);
        assert_eq!(out.column("Wind").unwrap().null_count(), 1);
        let humidity = out
            .column("Humidity")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0);
        assert_eq!(humidity, Some(70.0));
    }

    #[test]
    fn test_one_row_per_group() {
        let out = monthly(
            "Year,Month,Temperature\n\
             2021,March,70\n\
             2021,March,72\n\
             2021,April,80\n\
             2022,March,60\n\
             ,March,99\n",
        );
        assert_eq!(out.height(), 3);
        let years: Vec<Option<i64>> = out
            .column("Year")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(2021), Some(2021), Some(2022)]);
    }

    #[test]
    fn test_context_column_splits_groups() {
        let out = monthly(
            "Monitoring Stations,Year,Month,Temperature\n\
             Station A,2021,March,70\n\
             Station B,2021,March,80\n\
             Station A,2021,March,72\n",
        );
        assert_eq!(out.height(), 2);
        assert!(has_column(&out, "Monitoring Stations"));
    }

    #[test]
    fn test_context_grouping_can_be_disabled() {
        let config = PipelineConfig::default();
        let raw = read_table(
            b"Monitoring Stations,Year,Month,Temperature\n\
              Station A,2021,March,70\n\
              Station B,2021,March,80\n",
            "weather",
        )
        .unwrap();
        let weather = clean_weather(raw, &config).unwrap();
        let out = aggregate_monthly_with(&weather, &config, false).unwrap().into_inner();

        assert_eq!(out.height(), 1);
        assert!(!has_column(&out, "Monitoring Stations"));
        let temperature = out
            .column("Temperature")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0);
        assert_eq!(temperature, Some(75.0));
    }
}
