//! Phytoplankton Processor Library
//!
//! Cleans and merges a water-quality sample table with a weather observation
//! table into a single numeric training set for phytoplankton bloom
//! prediction.
//!
//! This library provides tools for:
//! - Reading uploaded CSV tables (UTF-8 or Latin-1)
//! - Coercing dirty numeric cells and coding categorical weather columns
//! - Aggregating weather to one row per month and joining it to samples
//! - Building a features/target training set with row accounting
//! - Splitting, scaling and scoring against opaque model backends
//! - Per-station forecasting glue for future-date predictions

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod forecast;
pub mod models;
pub mod processor;
pub mod reader;
pub mod schema;
pub mod training;

pub use config::PipelineConfig;
pub use error::{PhytoError, Result};
pub use models::{MergedFrame, PipelineStats, TaskMode, TrainingSet};
pub use processor::{PipelineOutput, PipelineProcessor};
