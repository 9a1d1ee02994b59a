//! Application constants for the phytoplankton processor
//!
//! Default column names, lookup tables and domain constants used to build
//! the default [`PipelineConfig`](crate::config::PipelineConfig). Every table
//! here can be replaced through a configuration file.

// =============================================================================
// Column Names
// =============================================================================

/// Column names as they appear in the monitoring agency's CSV exports
pub mod columns {
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const STATION: &str = "Monitoring Stations";

    pub const PHYTOPLANKTON: &str = "Phytoplankton (cells/ml)";
    pub const PH: &str = "pH (units)";
    pub const AMMONIA: &str = "Ammonia (mg/L)";
    pub const NITRATE: &str = "Nitrate (mg/L)";
    pub const PHOSPHATE: &str = "Inorganic Phosphate (mg/L)";
    pub const BOD: &str = "BOD (mg/l)";
    pub const DISSOLVED_OXYGEN: &str = "Dissolved Oxygen (mg/l)";
    pub const COLIFORMS: &str = "Total coliforms (MPN/100ml)";

    pub const TIME: &str = "Time";
    pub const TEMPERATURE: &str = "Temperature";
    pub const DEW_POINT: &str = "Dew Point";
    pub const HUMIDITY: &str = "Humidity";
    pub const WIND: &str = "Wind";
    pub const WIND_SPEED: &str = "Wind Speed";
    pub const WIND_GUST: &str = "Wind Gust";
    pub const PRESSURE: &str = "Pressure";
    pub const PRECIPITATION: &str = "Precip.";
    pub const CONDITION: &str = "Condition";

    /// Appended to a table by a persisted model
    pub const PREDICTION: &str = "Prediction";
}

/// Table labels used in logs and error messages
pub const WATER_QUALITY_TABLE: &str = "water quality";
pub const WEATHER_TABLE: &str = "weather";
pub const MONTHLY_WEATHER_TABLE: &str = "monthly weather";
pub const MERGED_TABLE: &str = "merged";

/// Weather columns that are never passed through numeric coercion
pub const EXCLUDED_WEATHER_COLUMNS: &[&str] = &[columns::MONTH, columns::WIND, columns::CONDITION];

/// Characters kept when stripping units from numeric weather cells
pub const NON_NUMERIC_PATTERN: &str = r"[^0-9.]";

/// Thousands separator found in phytoplankton counts
pub const GROUPING_SEPARATOR: &str = ",";

// =============================================================================
// Lookup Tables
// =============================================================================

/// Canonical month names, January first
pub const CANONICAL_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Misspellings and abbreviations observed in water-quality exports
pub const MONTH_CORRECTIONS: &[(&str, &str)] = &[
    ("Febuary", "February"),
    ("Aug", "August"),
    ("Sept", "September"),
    ("Nov", "November"),
    ("Dec", "December"),
];

/// Compass, variable and calm wind direction codes
pub const WIND_CODES: &[(&str, i32)] = &[
    ("N", 1),
    ("NNE", 2),
    ("NE", 3),
    ("ENE", 4),
    ("E", 5),
    ("ESE", 6),
    ("SE", 7),
    ("SSE", 8),
    ("S", 9),
    ("SSW", 10),
    ("SW", 11),
    ("WSW", 12),
    ("W", 13),
    ("WNW", 14),
    ("NW", 15),
    ("NNW", 16),
    ("VAR", 17),
    ("CALM", 18),
];

/// Sky condition descriptions and their codes
pub const CONDITION_CODES: &[(&str, i32)] = &[
    ("Fair", 1),
    ("Mostly Cloudy", 2),
    ("Partly Cloudy", 3),
    ("Cloudy", 4),
    ("Light Rain", 5),
    ("Light Rain Shower", 6),
    ("Rain", 7),
    ("Heavy Rain", 8),
    ("Thunder", 9),
    ("Light Rain with Thunder", 10),
    ("T-Storm", 11),
    ("Heavy Rain Shower", 12),
    ("Rain Shower", 13),
    ("Showers in the Vicinity", 14),
    ("Thunder in the Vicinity", 15),
    ("Mostly Cloudy / Windy", 16),
    ("Fair / Windy", 17),
    ("Partly Cloudy / Windy", 18),
    ("Rain / Windy", 19),
    ("Light Rain Shower / Windy", 20),
    ("Heavy Rain / Windy", 21),
];

// =============================================================================
// Training Defaults
// =============================================================================

/// Features used by the bloom models
pub const DEFAULT_FEATURES: &[&str] = &[
    columns::TEMPERATURE,
    columns::HUMIDITY,
    columns::WIND,
    columns::WIND_SPEED,
    columns::CONDITION,
    columns::PH,
    columns::AMMONIA,
    columns::NITRATE,
    columns::PHOSPHATE,
    columns::BOD,
    columns::DISSOLVED_OXYGEN,
    columns::COLIFORMS,
];

/// Phytoplankton density (cells/ml) above which a sample counts as a bloom
pub const BLOOM_THRESHOLD: f64 = 1000.0;

/// Fraction of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Seed for the train/test shuffle
pub const DEFAULT_SPLIT_SEED: u64 = 42;

// =============================================================================
// Forecasting Defaults
// =============================================================================

/// Non-seasonal (p, d, q) order for per-parameter forecasts
pub const SARIMA_ORDER: [usize; 3] = [1, 1, 1];

/// Seasonal (P, D, Q, s) order; monthly data with yearly seasonality
pub const SARIMA_SEASONAL_ORDER: [usize; 4] = [1, 1, 1, 12];

/// Water-quality parameters forecast ahead of a bloom prediction
pub const FORECAST_PARAMETERS: &[&str] = &[
    columns::PH,
    columns::AMMONIA,
    columns::PHOSPHATE,
    columns::BOD,
    columns::COLIFORMS,
];

/// Monitoring stations covered by the forecast service
pub const MONITORING_STATIONS: &[&str] = &[
    "Stn. I (Central West Bay)",
    "Stn V (Northern West Bay)",
    "Stn XIII (Taytay)",
    "Stn XV (San Pedro)",
    "Stn.XVI (Sta Rosa)",
    "Stn XIX (Muntinlupa)",
];

/// Month number (1-12) for a canonical month name
pub fn month_number(name: &str) -> Option<u32> {
    CANONICAL_MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|index| index as u32 + 1)
}
