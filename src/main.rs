use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use phyto_processor::cli::Args;
use phyto_processor::constants::columns;
use phyto_processor::forecast::{SeasonalNaive, forecast_feature_row, forecast_station_inputs};
use phyto_processor::processor::{PipelineOutput, PipelineProcessor, TableWriter};
use phyto_processor::schema::has_column;
use phyto_processor::training::{
    FittedModel, ModelBackend, backend_named, baseline_for, evaluate, predict, predict_frame,
};
use phyto_processor::{PipelineConfig, TaskMode};
use polars::prelude::DataFrame;
use std::path::Path;
use std::process;
use tracing::{debug, info, warn};

fn main() {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {:#}", error);
        process::exit(1);
    }

    match run(&args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("phyto_processor={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = args
        .pipeline_config()
        .context("Failed to load pipeline configuration")?;
    let compression = args.compression()?;

    let processor = PipelineProcessor::new(config.clone())?;
    let output = processor
        .run_paths(&args.water_quality, &args.weather)
        .context("Pipeline failed")?;

    print_summary(&output, &config);

    let predictor = match &args.predict_with {
        Some(path) => Some(load_predictor(path)?),
        None => None,
    };

    let mut merged = output.merged.clone().into_inner();
    if let Some((backend, model)) = &predictor {
        merged = predict_frame(backend.as_ref(), model, &merged)
            .context("Failed to predict merged rows")?;
        print_predictions(&merged, model, &config)?;
    }

    if let Some(path) = &args.output_path {
        let writer = TableWriter::new(path.clone(), compression)?;
        let rows = writer
            .write(&mut merged)
            .with_context(|| format!("Failed to write merged table to {}", path.display()))?;
        println!("{} {} ({} rows)", "Merged table:".bright_blue(), path.display(), rows);
    }

    if args.prepare_only {
        info!("Prepare-only mode: skipping model evaluation");
        return Ok(());
    }

    evaluate_baseline(args, &output, &config)?;

    if let Some(target) = args.forecast_date {
        forecast_inputs(args, &output, &config, target, predictor.as_ref())?;
    }

    Ok(())
}

fn print_summary(output: &PipelineOutput, config: &PipelineConfig) {
    let stats = &output.stats;

    println!();
    println!("{}", "Pipeline Summary".bright_green().bold());
    println!("{}", "=".repeat(40));
    println!("{:<24} {}", "Task mode:", config.mode);
    println!("{:<24} {}", "Water-quality rows:", stats.water_rows);
    println!("{:<24} {}", "Weather rows:", stats.weather_rows);
    println!("{:<24} {}", "Monthly weather groups:", stats.monthly_groups);
    println!("{:<24} {}", "Merged rows:", stats.merged_rows);
    if stats.unmatched_rows() > 0 {
        println!(
            "{:<24} {}",
            "Without weather:",
            stats.unmatched_rows().to_string().yellow()
        );
    }
    println!("{:<24} {}", "Training rows:", stats.retained_rows.to_string().green());
    if stats.dropped_rows > 0 {
        println!(
            "{:<24} {}",
            "Dropped (incomplete):",
            stats.dropped_rows.to_string().yellow()
        );
    }
    println!("{:<24} {}", "Features:", output.training.n_features());
    println!("{:<24} {} ms", "Processing time:", stats.processing_time_ms);
    println!();
}

/// Load a persisted model together with the backend that fitted it
fn load_predictor(path: &Path) -> Result<(Box<dyn ModelBackend>, FittedModel)> {
    let model = FittedModel::load(path)
        .with_context(|| format!("Failed to load model from {}", path.display()))?;
    let backend = backend_named(&model.backend)?;
    info!(
        "Loaded {} model ({} mode, {} features) from {}",
        model.backend,
        model.mode,
        model.feature_names.len(),
        path.display()
    );
    Ok((backend, model))
}

fn print_predictions(merged: &DataFrame, model: &FittedModel, config: &PipelineConfig) -> Result<()> {
    let predictions = merged.column(columns::PREDICTION)?.as_materialized_series().f64()?;
    let predicted = predictions.len() - predictions.null_count();

    println!(
        "{} {} ({} of {} rows)",
        "Predictions:".bright_green().bold(),
        model.backend,
        predicted,
        merged.height()
    );
    if model.mode == TaskMode::Classification {
        let blooms = predictions.into_iter().flatten().filter(|p| *p == 1.0).count();
        println!("{:<24} {}", "Predicted blooms:", blooms.to_string().yellow());
    }

    let mut shown: Vec<String> = [
        config.context_column.as_deref(),
        Some(config.year_column.as_str()),
        Some(config.month_column.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|name| has_column(merged, name))
    .map(str::to_string)
    .collect();
    shown.push(columns::PREDICTION.to_string());
    println!("{}", merged.select(shown)?);
    println!();
    Ok(())
}

fn evaluate_baseline(args: &Args, output: &PipelineOutput, config: &PipelineConfig) -> Result<()> {
    let backend = baseline_for(config.mode);
    let outcome = match evaluate(backend.as_ref(), &output.training, config.mode, &config.split) {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!("Skipping model evaluation: {}", error);
            println!(
                "{} {}",
                "Baseline evaluation skipped:".yellow().bold(),
                error
            );
            println!();
            return Ok(());
        }
    };

    println!(
        "{} {} ({} train / {} test rows)",
        "Baseline evaluation:".bright_green().bold(),
        backend.name(),
        outcome.train_rows,
        outcome.test_rows
    );
    println!("{}", outcome.evaluation);
    println!();

    if let Some(path) = &args.model_path {
        outcome
            .model
            .save(path)
            .with_context(|| format!("Failed to save model to {}", path.display()))?;
        println!("{} {}", "Model saved:".bright_blue(), path.display());
    }
    Ok(())
}

fn forecast_inputs(
    args: &Args,
    output: &PipelineOutput,
    config: &PipelineConfig,
    target: chrono::NaiveDate,
    predictor: Option<&(Box<dyn ModelBackend>, FittedModel)>,
) -> Result<()> {
    let forecaster = SeasonalNaive::from_config(&config.forecast)?;

    println!("{} {}", "Forecast inputs for".bright_green().bold(), target);
    for station in args.forecast_stations(config) {
        match forecast_station_inputs(&forecaster, &output.merged, config, &station, target) {
            Ok(inputs) => {
                println!("  {}", station.bold());
                for (parameter, value) in inputs {
                    println!("    {:<32} {:.3}", parameter, value);
                }
            }
            Err(error) => {
                println!("  {} {}", station.bold(), error.to_string().red());
                continue;
            }
        }

        if let Some((backend, model)) = predictor {
            let prediction = forecast_feature_row(
                &forecaster,
                &output.merged,
                config,
                &station,
                target,
                &model.feature_names,
            )
            .and_then(|row| predict(backend.as_ref(), model, &[row]));
            match prediction {
                Ok(values) => {
                    for value in values {
                        println!("    {:<32} {}", "Prediction".bold(), describe_prediction(model.mode, value));
                    }
                }
                Err(error) => println!("    {} {}", "Prediction".bold(), error.to_string().red()),
            }
        }
    }
    Ok(())
}

fn describe_prediction(mode: TaskMode, value: f64) -> String {
    match mode {
        TaskMode::Classification if value == 1.0 => "bloom".red().to_string(),
        TaskMode::Classification => "no bloom".green().to_string(),
        TaskMode::Regression => format!("{:.1} cells/ml", value),
    }
}
