//! CSV ingestion for uploaded water-quality and weather tables.
//!
//! Tables are parsed with every column as a string so that dirty cells
//! ("75F", "1,500", "CALM") survive ingestion and are coerced by the pipeline
//! stages instead of by type inference. Files exported as Latin-1 are decoded
//! transparently.

use crate::error::{PhytoError, Result};
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Decode UTF-8, falling back to Latin-1 (every byte maps to one code point)
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("Input is not valid UTF-8, decoding as Latin-1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// Parse CSV bytes (with a header row) into an all-string frame
pub fn read_table(bytes: &[u8], table: &str) -> Result<DataFrame> {
    let text = decode_text(bytes);
    let text = text.trim_start_matches('\u{feff}');

    if text.trim().is_empty() {
        return Err(PhytoError::invalid_input(table, "file is empty"));
    }

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
        .finish()?;

    let trimmed: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect();
    frame.set_column_names(trimmed)?;

    debug!(
        "Read {} table: {} rows, {} columns",
        table,
        frame.height(),
        frame.width()
    );

    Ok(frame)
}

/// Read a CSV file from disk
pub fn read_table_from_path(path: &Path, table: &str) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PhytoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    read_table(&bytes, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_text(b"plain"), "plain");
        // 0xB0 is the degree sign in ISO-8859-1
        assert_eq!(decode_text(&[b'7', b'5', 0xB0, b'F']), "75\u{b0}F");
    }

    #[test]
    fn test_read_table_keeps_everything_as_text() {
        let csv = "Year,Month,Temperature,Wind\n2021,February,75F,N\n2021,March,,CALM\n";
        let frame = read_table(csv.as_bytes(), "weather").unwrap();

        assert_eq!(frame.height(), 2);
        for name in ["Year", "Month", "Temperature", "Wind"] {
            assert_eq!(frame.column(name).unwrap().dtype(), &DataType::String);
        }
        let temperature = frame
            .column("Temperature")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .clone();
        assert_eq!(temperature.get(0), Some("75F"));
        assert_eq!(temperature.get(1), None);
    }

    #[test]
    fn test_read_table_trims_header_names() {
        let csv = "\u{feff}Year , Month\n2021,May\n";
        let frame = read_table(csv.as_bytes(), "weather").unwrap();
        assert_eq!(crate::schema::column_names(&frame), vec!["Year", "Month"]);
    }

    #[test]
    fn test_read_table_quoted_separators() {
        let csv = "Month,Phytoplankton (cells/ml)\nFebuary,\"1,500\"\n";
        let frame = read_table(csv.as_bytes(), "water quality").unwrap();
        let value = frame
            .column("Phytoplankton (cells/ml)")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(0)
            .map(str::to_string);
        assert_eq!(value.as_deref(), Some("1,500"));
    }

    #[test]
    fn test_read_latin1_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Year,Month,Temperature\n2021,June,84\xb0F\n")
            .unwrap();

        let frame = read_table_from_path(file.path(), "weather").unwrap();
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn test_empty_and_missing_input() {
        assert!(matches!(
            read_table(b"  \n", "weather"),
            Err(PhytoError::InvalidInput { .. })
        ));
        assert!(matches!(
            read_table_from_path(Path::new("/nonexistent/weather.csv"), "weather"),
            Err(PhytoError::FileNotFound { .. })
        ));
    }
}
