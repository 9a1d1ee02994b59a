//! Configuration management and validation.
//!
//! Column names, lookup tables and domain constants are configuration data,
//! not inline logic: defaults come from [`crate::constants`] and any field can
//! be overridden from a TOML file.

use crate::constants::{self, columns};
use crate::error::{PhytoError, Result};
use crate::models::TaskMode;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Closed label-to-code enumeration for a categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(BTreeMap<String, i32>);

impl Vocabulary {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(label, code)| (label.to_string(), code))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(label, code)| (label.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.is_empty() {
            return Err(PhytoError::configuration(format!(
                "{name} vocabulary is empty"
            )));
        }
        let mut seen = HashSet::new();
        for (label, code) in self.iter() {
            if !seen.insert(code) {
                return Err(PhytoError::configuration(format!(
                    "{name} vocabulary assigns code {code} more than once (at '{label}')"
                )));
            }
        }
        Ok(())
    }
}

/// Misspelling/abbreviation to canonical month name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthCorrections(BTreeMap<String, String>);

impl MonthCorrections {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }
}

/// Deterministic hold-out split settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: constants::DEFAULT_TEST_FRACTION,
            seed: constants::DEFAULT_SPLIT_SEED,
        }
    }
}

/// Per-parameter forecast settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Non-seasonal (p, d, q)
    pub order: [usize; 3],
    /// Seasonal (P, D, Q, s)
    pub seasonal_order: [usize; 4],
    pub parameters: Vec<String>,
    pub stations: Vec<String>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            order: constants::SARIMA_ORDER,
            seasonal_order: constants::SARIMA_SEASONAL_ORDER,
            parameters: to_strings(constants::FORECAST_PARAMETERS),
            stations: to_strings(constants::MONITORING_STATIONS),
        }
    }
}

impl ForecastConfig {
    /// Season length in periods
    pub fn season_length(&self) -> usize {
        self.seasonal_order[3]
    }
}

/// Supported compression algorithms for parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = PhytoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(PhytoError::configuration(format!(
                "unsupported compression '{other}' (expected snappy, zstd, lz4 or none)"
            ))),
        }
    }
}

/// Global configuration for one pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub year_column: String,
    pub month_column: String,
    pub wind_column: String,
    pub condition_column: String,
    pub phytoplankton_column: String,

    /// Extra grouping/join key (e.g. monitoring station), used only where present
    pub context_column: Option<String>,

    /// Weather columns left out of numeric coercion
    pub excluded_weather_columns: Vec<String>,

    pub month_corrections: MonthCorrections,
    pub wind_codes: Vocabulary,
    pub condition_codes: Vocabulary,

    pub features: Vec<String>,
    pub target: String,
    pub mode: TaskMode,

    /// Density strictly above which a row is labelled as a bloom
    pub bloom_threshold: f64,

    pub split: SplitConfig,
    pub forecast: ForecastConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            year_column: columns::YEAR.to_string(),
            month_column: columns::MONTH.to_string(),
            wind_column: columns::WIND.to_string(),
            condition_column: columns::CONDITION.to_string(),
            phytoplankton_column: columns::PHYTOPLANKTON.to_string(),
            context_column: Some(columns::STATION.to_string()),
            excluded_weather_columns: to_strings(constants::EXCLUDED_WEATHER_COLUMNS),
            month_corrections: MonthCorrections::from_pairs(
                constants::MONTH_CORRECTIONS.iter().copied(),
            ),
            wind_codes: Vocabulary::from_pairs(constants::WIND_CODES.iter().copied()),
            condition_codes: Vocabulary::from_pairs(constants::CONDITION_CODES.iter().copied()),
            features: to_strings(constants::DEFAULT_FEATURES),
            target: columns::PHYTOPLANKTON.to_string(),
            mode: TaskMode::Classification,
            bloom_threshold: constants::BLOOM_THRESHOLD,
            split: SplitConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document; omitted fields keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PhytoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Check internal consistency before any data is touched
    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(PhytoError::configuration("no features configured"));
        }
        let mut seen = HashSet::new();
        for feature in &self.features {
            if !seen.insert(feature.as_str()) {
                return Err(PhytoError::configuration(format!(
                    "feature '{feature}' is listed more than once"
                )));
            }
        }
        if self.target.is_empty() {
            return Err(PhytoError::configuration("target column name is empty"));
        }
        if !self.bloom_threshold.is_finite() {
            return Err(PhytoError::configuration("bloom threshold must be finite"));
        }
        if !(self.split.test_fraction > 0.0 && self.split.test_fraction < 1.0) {
            return Err(PhytoError::configuration(format!(
                "test fraction {} is outside (0, 1)",
                self.split.test_fraction
            )));
        }
        if self.forecast.season_length() == 0 {
            return Err(PhytoError::configuration("seasonal period must be positive"));
        }
        self.wind_codes.validate("wind")?;
        self.condition_codes.validate("condition")?;
        Ok(())
    }

    /// True for weather columns that keep their raw (non-numeric) form
    pub fn is_excluded_weather_column(&self, name: &str) -> bool {
        self.excluded_weather_columns.iter().any(|c| c == name)
            || self.context_column.as_deref() == Some(name)
    }

    pub fn with_mode(mut self, mode: TaskMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_bloom_threshold(mut self, threshold: f64) -> Self {
        self.bloom_threshold = threshold;
        self
    }

    pub fn with_context_column(mut self, column: Option<String>) -> Self {
        self.context_column = column;
        self
    }

    pub fn with_split(mut self, test_fraction: f64, seed: u64) -> Self {
        self.split = SplitConfig {
            test_fraction,
            seed,
        };
        self
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
