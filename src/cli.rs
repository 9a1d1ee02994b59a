//! Command-line interface components.

use crate::config::{CompressionAlgorithm, PipelineConfig};
use crate::error::Result;
use crate::models::TaskMode;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phyto")]
#[command(about = "Clean and merge water-quality and weather tables into a phytoplankton training set")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Water-quality CSV (one row per station sample)
    #[arg(value_name = "WATER_QUALITY_CSV")]
    pub water_quality: PathBuf,

    /// Weather CSV (one row per observation)
    #[arg(value_name = "WEATHER_CSV")]
    pub weather: PathBuf,

    /// TOML configuration file overriding column names and lookup tables
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Task the training set is built for
    #[arg(long, value_enum)]
    pub mode: Option<TaskMode>,

    /// Phytoplankton density above which a sample counts as a bloom
    #[arg(long)]
    pub bloom_threshold: Option<f64>,

    /// Write the merged table here (.parquet or .csv)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Persist the fitted reference model as JSON
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Predict with a persisted model JSON; predictions are printed and added to -o
    #[arg(long, value_name = "MODEL_JSON")]
    pub predict_with: Option<PathBuf>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Stop after building the training set (no model evaluation)
    #[arg(long)]
    pub prepare_only: bool,

    /// Forecast station inputs for this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub forecast_date: Option<NaiveDate>,

    /// Station to forecast (repeatable; defaults to the configured list)
    #[arg(long = "station", value_name = "NAME")]
    pub stations: Vec<String>,

    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn compression(&self) -> Result<CompressionAlgorithm> {
        self.compression.parse()
    }

    /// Defaults, then the config file, then command-line overrides
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(mode) = self.mode {
            config = config.with_mode(mode);
        }
        if let Some(threshold) = self.bloom_threshold {
            config = config.with_bloom_threshold(threshold);
        }
        config.validate()?;
        Ok(config)
    }

    /// Stations to forecast: explicit flags win over configuration
    pub fn forecast_stations(&self, config: &PipelineConfig) -> Vec<String> {
        if self.stations.is_empty() {
            config.forecast.stations.clone()
        } else {
            self.stations.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["phyto", "water.csv", "weather.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.log_level(), "warn");
        assert_eq!(args.compression().unwrap(), CompressionAlgorithm::Snappy);
        assert!(!args.prepare_only);
        assert!(args.predict_with.is_none());

        let config = args.pipeline_config().unwrap();
        assert_eq!(config.mode, TaskMode::Classification);
        assert_eq!(args.forecast_stations(&config).len(), 6);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--mode",
            "regression",
            "--bloom-threshold",
            "500",
            "-vv",
            "--compression",
            "zstd",
            "--forecast-date",
            "2024-06-01",
            "--station",
            "Station A",
            "--predict-with",
            "bloom_model.json",
        ]);
        assert_eq!(args.log_level(), "debug");
        assert_eq!(args.compression().unwrap(), CompressionAlgorithm::Zstd);
        assert_eq!(args.forecast_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(args.predict_with, Some(PathBuf::from("bloom_model.json")));

        let config = args.pipeline_config().unwrap();
        assert_eq!(config.mode, TaskMode::Regression);
        assert_eq!(config.bloom_threshold, 500.0);
        assert_eq!(args.forecast_stations(&config), vec!["Station A"]);
    }

    #[test]
    fn test_bad_compression() {
        assert!(parse(&["--compression", "gzip"]).compression().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["phyto", "a.csv", "b.csv", "-q", "-v"]).is_err());
        assert_eq!(parse(&["-q"]).log_level(), "error");
    }
}
