//! Merge-and-clean pipeline.
//!
//! Orchestrates the complete workflow for one pair of uploaded tables:
//! ingestion, cleaning, monthly weather aggregation, inner join and
//! reduction to a training set. Each stage lives in its own module and can
//! be called on its own; [`PipelineProcessor`] runs them in order and keeps
//! the row accounting.

pub mod aggregation;
pub mod cleaning;
pub mod merge;
pub mod training_frame;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use self::aggregation::{aggregate_monthly, aggregate_monthly_with};
pub use self::cleaning::{clean_water_quality, clean_weather};
pub use self::merge::merge;
pub use self::training_frame::build_training_frame;
pub use self::writer::{TableFormat, TableWriter};

use crate::config::PipelineConfig;
use crate::constants::{WATER_QUALITY_TABLE, WEATHER_TABLE};
use crate::error::Result;
use crate::models::{MergedFrame, PipelineStats, TrainingSet};
use crate::reader::{read_table, read_table_from_path};
use crate::schema::has_column;

use polars::prelude::DataFrame;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one pipeline invocation produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub merged: MergedFrame,
    pub training: TrainingSet,
    pub stats: PipelineStats,
}

/// Runs the pipeline stages with a fixed configuration
#[derive(Debug, Clone)]
pub struct PipelineProcessor {
    config: PipelineConfig,
}

impl PipelineProcessor {
    /// Create a processor, rejecting inconsistent configuration up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run on two CSV files
    pub fn run_paths(&self, water_quality: &Path, weather: &Path) -> Result<PipelineOutput> {
        debug!(
            "Reading inputs: water quality = {}, weather = {}",
            water_quality.display(),
            weather.display()
        );
        let start_time = Instant::now();
        let water_raw = read_table_from_path(water_quality, WATER_QUALITY_TABLE)?;
        let weather_raw = read_table_from_path(weather, WEATHER_TABLE)?;
        self.finish_timed(water_raw, weather_raw, start_time)
    }

    /// Run on two in-memory CSV byte streams
    pub fn run(&self, water_quality: &[u8], weather: &[u8]) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        let water_raw = read_table(water_quality, WATER_QUALITY_TABLE)?;
        let weather_raw = read_table(weather, WEATHER_TABLE)?;
        self.finish_timed(water_raw, weather_raw, start_time)
    }

    /// Run on raw (uncleaned) frames
    pub fn run_frames(&self, water_raw: DataFrame, weather_raw: DataFrame) -> Result<PipelineOutput> {
        self.finish_timed(water_raw, weather_raw, Instant::now())
    }

    fn finish_timed(
        &self,
        water_raw: DataFrame,
        weather_raw: DataFrame,
        start_time: Instant,
    ) -> Result<PipelineOutput> {
        let config = &self.config;

        let water = clean_water_quality(water_raw, config)?;
        let weather = clean_weather(weather_raw, config)?;
        // Weather is only split by context when the samples can join on it
        let group_by_context = config
            .context_column
            .as_deref()
            .is_some_and(|context| has_column(water.frame(), context));
        let monthly = aggregate_monthly_with(&weather, config, group_by_context)?;
        let merged = merge(&water, &monthly, config)?;
        let (training, accounting) = build_training_frame(
            &merged,
            &config.features,
            &config.target,
            config.mode,
            config.bloom_threshold,
        )?;

        let stats = PipelineStats {
            water_rows: water.height(),
            weather_rows: weather.height(),
            monthly_groups: monthly.height(),
            merged_rows: accounting.merged_rows,
            retained_rows: accounting.retained_rows,
            dropped_rows: accounting.dropped_rows,
            processing_time_ms: start_time.elapsed().as_millis(),
        };

        info!(
            "Pipeline complete: {} water rows, {} weather rows, {} monthly groups, {} merged, {} retained, {} dropped",
            stats.water_rows,
            stats.weather_rows,
            stats.monthly_groups,
            stats.merged_rows,
            stats.retained_rows,
            stats.dropped_rows
        );

        Ok(PipelineOutput {
            merged,
            training,
            stats,
        })
    }
}
