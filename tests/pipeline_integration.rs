//! End-to-end tests through the public API: files in, merged table,
//! evaluated model and forecasts out.

use chrono::NaiveDate;
use phyto_processor::config::CompressionAlgorithm;
use phyto_processor::constants::columns;
use phyto_processor::forecast::{SeasonalNaive, forecast_feature_row, forecast_station_inputs};
use phyto_processor::processor::TableWriter;
use phyto_processor::training::{
    Evaluation, FittedModel, backend_named, baseline_for, evaluate, predict, predict_frame,
};
use phyto_processor::{PipelineConfig, PipelineProcessor, TaskMode};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::PathBuf;
use tempfile::TempDir;

const MONTHS: [&str; 6] = ["January", "Febuary", "March", "April", "May", "June"];

/// Two stations sampled monthly for the first half of 2021
fn write_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let mut water = String::from(
        "Monitoring Stations,Year,Month,pH (units),Ammonia (mg/L),Inorganic Phosphate (mg/L),BOD (mg/l),Total coliforms (MPN/100ml),Phytoplankton (cells/ml)\n",
    );
    for (i, month) in MONTHS.iter().enumerate() {
        for (station, base) in [("Station A", 500), ("Station B", 900)] {
            let density = base + 200 * i;
            water.push_str(&format!(
                "{station},2021,{month},{:.1},0.{},0.{},{},{},\"{},{:03}\"\n",
                7.0 + i as f64 / 10.0,
                i + 1,
                i + 2,
                2 + i,
                100 + i,
                density / 1000,
                density % 1000
            ));
        }
    }
    // a sample without weather context
    water.push_str("Station A,2020,December,7.0,0.1,0.1,2,100,300\n");

    let mut weather = String::from("Year,Month,Time,Temperature,Humidity,Wind,Wind Speed,Condition\n");
    for (i, month) in MONTHS.iter().enumerate() {
        let month = if *month == "Febuary" { "February" } else { *month };
        weather.push_str(&format!(
            "2021,{month},1:00 AM,{}F,{}%,N,{} mph,Fair\n",
            70 + i,
            60 + i,
            5 + i
        ));
        weather.push_str(&format!(
            "2021,{month},1:00 PM,{}F,{}%,NNE,{} mph,Cloudy\n",
            72 + i,
            62 + i,
            7 + i
        ));
        weather.push_str(&format!("2021,{month},7:00 PM,,n/a,N,calm,Fair\n"));
    }

    let water_path = dir.path().join("water_quality.csv");
    let weather_path = dir.path().join("weather.csv");
    fs::write(&water_path, water).unwrap();
    fs::write(&weather_path, weather).unwrap();
    (water_path, weather_path)
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_features([
        "Temperature",
        "Humidity",
        "Wind",
        "Wind Speed",
        "Condition",
        "pH (units)",
        "Ammonia (mg/L)",
    ])
}

#[test]
fn test_files_to_training_set() {
    let temp_dir = TempDir::new().unwrap();
    let (water_path, weather_path) = write_inputs(&temp_dir);

    let output = PipelineProcessor::new(config())
        .unwrap()
        .run_paths(&water_path, &weather_path)
        .unwrap();

    assert_eq!(output.stats.water_rows, 13);
    assert_eq!(output.stats.weather_rows, 18);
    assert_eq!(output.stats.monthly_groups, 6);
    assert_eq!(output.stats.merged_rows, 12);
    assert_eq!(output.stats.unmatched_rows(), 1);
    assert_eq!(output.stats.retained_rows, 12);

    // densities above 1000 are blooms
    let blooms = output.training.target.iter().filter(|t| **t == 1.0).count();
    assert_eq!(blooms, 8);

    // January: mean of 70F and 72F, the blank evening reading ignored
    let temperatures = output.training.feature_column("Temperature").unwrap();
    assert!(temperatures.contains(&71.0));
    let winds = output.training.feature_column("Wind").unwrap();
    assert!(winds.iter().all(|w| *w == 1.0));
}

#[test]
fn test_merged_table_written_and_model_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let (water_path, weather_path) = write_inputs(&temp_dir);
    let output = PipelineProcessor::new(config())
        .unwrap()
        .run_paths(&water_path, &weather_path)
        .unwrap();

    let parquet_path = temp_dir.path().join("out").join("merged.parquet");
    let writer = TableWriter::new(parquet_path.clone(), CompressionAlgorithm::Snappy).unwrap();
    let mut merged = output.merged.clone().into_inner();
    assert_eq!(writer.write(&mut merged).unwrap(), 12);

    let read_back = ParquetReader::new(File::open(&parquet_path).unwrap())
        .finish()
        .unwrap();
    assert_eq!(read_back.height(), 12);

    let backend = baseline_for(TaskMode::Classification);
    let outcome = evaluate(
        backend.as_ref(),
        &output.training,
        TaskMode::Classification,
        &config().split,
    )
    .unwrap();
    assert_eq!(outcome.test_rows, 3);
    assert!(matches!(outcome.evaluation, Evaluation::Classification(_)));

    let model_path = temp_dir.path().join("bloom_model.json");
    outcome.model.save(&model_path).unwrap();
    let loaded = FittedModel::load(&model_path).unwrap();
    let predictions = predict(backend.as_ref(), &loaded, &output.training.features).unwrap();
    assert_eq!(predictions.len(), 12);
}

#[test]
fn test_forecast_from_merged_history() {
    let temp_dir = TempDir::new().unwrap();
    let (water_path, weather_path) = write_inputs(&temp_dir);
    let config = config();
    let output = PipelineProcessor::new(config.clone())
        .unwrap()
        .run_paths(&water_path, &weather_path)
        .unwrap();

    let forecaster = SeasonalNaive::from_config(&config.forecast).unwrap();
    let target = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
    let inputs =
        forecast_station_inputs(&forecaster, &output.merged, &config, "Station B", target).unwrap();

    assert_eq!(inputs.len(), config.forecast.parameters.len());
    // history shorter than a season repeats the June value
    assert!((inputs["pH (units)"] - 7.5).abs() < 1e-9);
}

#[test]
fn test_persisted_model_predicts_merged_and_forecast_rows() {
    let temp_dir = TempDir::new().unwrap();
    let (water_path, weather_path) = write_inputs(&temp_dir);
    let config = config();
    let output = PipelineProcessor::new(config.clone())
        .unwrap()
        .run_paths(&water_path, &weather_path)
        .unwrap();

    let outcome = evaluate(
        baseline_for(config.mode).as_ref(),
        &output.training,
        config.mode,
        &config.split,
    )
    .unwrap();
    let model_path = temp_dir.path().join("bloom_model.json");
    outcome.model.save(&model_path).unwrap();

    // a later run loads the model by path alone
    let model = FittedModel::load(&model_path).unwrap();
    let backend = backend_named(&model.backend).unwrap();
    let mut predicted = predict_frame(backend.as_ref(), &model, output.merged.frame()).unwrap();
    assert_eq!(predicted.height(), 12);
    let predictions = predicted
        .column(columns::PREDICTION)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap();
    assert_eq!(predictions.null_count(), 0);
    // 8 of 12 training rows are blooms, so the majority label is bloom
    assert!(predictions.into_iter().all(|p| p == Some(1.0)));

    let csv_path = temp_dir.path().join("predicted.csv");
    let writer = TableWriter::new(csv_path.clone(), CompressionAlgorithm::Snappy).unwrap();
    assert_eq!(writer.write(&mut predicted).unwrap(), 12);
    let written = fs::read_to_string(&csv_path).unwrap();
    assert!(written.lines().next().unwrap().contains(columns::PREDICTION));

    let forecaster = SeasonalNaive::from_config(&config.forecast).unwrap();
    let target = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
    let row = forecast_feature_row(
        &forecaster,
        &output.merged,
        &config,
        "Station A",
        target,
        &model.feature_names,
    )
    .unwrap();
    assert_eq!(row.len(), model.feature_names.len());
    assert_eq!(predict(backend.as_ref(), &model, &[row]).unwrap(), vec![1.0]);
}
