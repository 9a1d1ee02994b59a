//! Strict inner join of water-quality samples with monthly weather.

use crate::config::PipelineConfig;
use crate::constants::{MERGED_TABLE, MONTHLY_WEATHER_TABLE, WATER_QUALITY_TABLE};
use crate::error::{PhytoError, Result};
use crate::models::{MergedFrame, MonthlyWeather, WaterQualityFrame};
use crate::schema::{has_column, month_key, require_columns, year_key};
use polars::prelude::*;
use tracing::{debug, warn};

/// Inner-join on (Year, Month), plus the context column when both sides have it
///
/// A sample without matching weather context cannot be trained on, so it is
/// discarded rather than kept with missing weather values. Monthly weather
/// grouped by a context column the samples lack is a schema error: joining it
/// on (Year, Month) alone would repeat each sample once per context value.
pub fn merge(
    water: &WaterQualityFrame,
    monthly: &MonthlyWeather,
    config: &PipelineConfig,
) -> Result<MergedFrame> {
    let year = config.year_column.as_str();
    let month = config.month_column.as_str();
    require_columns(water.frame(), WATER_QUALITY_TABLE, [year, month])?;
    require_columns(monthly.frame(), MONTHLY_WEATHER_TABLE, [year, month])?;

    let mut keys = vec![col(year), col(month)];
    if let Some(context) = config.context_column.as_deref() {
        match (has_column(water.frame(), context), has_column(monthly.frame(), context)) {
            (true, true) => keys.push(col(context)),
            (false, true) => {
                return Err(PhytoError::Schema {
                    table: WATER_QUALITY_TABLE.to_string(),
                    missing: vec![context.to_string()],
                });
            }
            _ => {}
        }
    }

    let water_side = water
        .frame()
        .clone()
        .lazy()
        .with_columns([year_key(year), month_key(month)]);
    let weather_side = monthly
        .frame()
        .clone()
        .lazy()
        .with_columns([year_key(year), month_key(month)]);

    let merged = water_side
        .join(
            weather_side,
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    let unmatched = water.height().saturating_sub(merged.height());
    if unmatched > 0 {
        warn!(
            "{} of {} water-quality rows had no matching monthly weather and were discarded",
            unmatched,
            water.height()
        );
    }
    debug!(
        "Built {} table: {} rows, {} columns",
        MERGED_TABLE,
        merged.height(),
        merged.width()
    );

    Ok(MergedFrame::from_frame(merged))
}
