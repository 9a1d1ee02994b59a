//! Integration tests for the processor module
//!
//! Runs the complete pipeline over small hand-written water-quality and
//! weather tables.


use crate::config::PipelineConfig;
use crate::processor::PipelineProcessor;

/// Water-quality table with one dirty month and a grouped count
pub const WATER_CSV: &str = "\
Monitoring Stations,Year,Month,pH (units),Ammonia (mg/L),Nitrate (mg/L),Inorganic Phosphate (mg/L),BOD (mg/l),Dissolved Oxygen (mg/l),Total coliforms (MPN/100ml),Phytoplankton (cells/ml)
Station A,2021,Febuary,7.1,0.2,1.5,0.3,2.0,6.5,120,\"1,500\"
";

/// Weather observations for the same month, with unit suffixes
pub const WEATHER_CSV: &str = "\
Year,Month,Time,Temperature,Dew Point,Humidity,Wind,Wind Speed,Wind Gust,Pressure,Precip.,Condition
2021,February,1:53 AM,75F,60F,70%,N,5 mph,0 mph,29.80 in,0.0 in,Fair
";

pub fn processor() -> PipelineProcessor {
    PipelineProcessor::new(PipelineConfig::default()).unwrap()
}
