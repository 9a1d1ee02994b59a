//! Output of the merged table.
//!
//! The pipeline itself persists nothing; this writer is used by callers that
//! want to keep the merged table for inspection or later forecasting.

use crate::config::CompressionAlgorithm;
use crate::error::{PhytoError, Result};
use polars::prelude::{CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output format, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("parquet") => Ok(Self::Parquet),
            Some("csv") => Ok(Self::Csv),
            _ => Err(PhytoError::configuration(format!(
                "cannot infer output format for {} (use .parquet or .csv)",
                path.display()
            ))),
        }
    }
}

/// Writes a frame as Parquet or CSV
#[derive(Debug)]
pub struct TableWriter {
    output_path: PathBuf,
    format: TableFormat,
    compression: CompressionAlgorithm,
}

impl TableWriter {
    pub fn new(output_path: PathBuf, compression: CompressionAlgorithm) -> Result<Self> {
        let format = TableFormat::from_path(&output_path)?;
        Ok(Self {
            output_path,
            format,
            compression,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write the frame, creating parent directories; returns rows written
    pub fn write(&self, frame: &mut DataFrame) -> Result<usize> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(&self.output_path)?;
        match self.format {
            TableFormat::Parquet => {
                PolarsParquetWriter::new(file)
                    .with_compression(self.compression.to_polars_compression())
                    .finish(frame)?;
            }
            TableFormat::Csv => {
                CsvWriter::new(&mut file).include_header(true).finish(frame)?;
            }
        }

        debug!(
            "Wrote {} rows to {} ({:?}, {:?})",
            frame.height(),
            self.output_path.display(),
            self.format,
            self.compression
        );
        Ok(frame.height())
    }
}
