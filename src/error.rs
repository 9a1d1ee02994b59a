//! Error handling for the merge-and-clean pipeline.
//!
//! Dirty cells never produce errors (they become missing values). Errors are
//! reserved for unreadable input, absent columns, bad configuration and
//! model or forecast failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhytoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Input file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid {table} input: {reason}")]
    InvalidInput { table: String, reason: String },

    #[error("Schema error in {table} table: missing column(s) {}", .missing.join(", "))]
    Schema { table: String, missing: Vec<String> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Forecast error: {message}")]
    Forecast { message: String },
}

impl PhytoError {
    pub fn invalid_input(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            table: table.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    pub fn forecast(message: impl Into<String>) -> Self {
        Self::Forecast {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PhytoError>;
