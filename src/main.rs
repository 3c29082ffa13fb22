use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use prognos_report::aggregate::DashboardSummary;
use prognos_report::config::Config;
use prognos_report::output;
use prognos_report::records::{AnalysisSnapshot, PredictionPayload};
use prognos_report::report::ReportDocument;
use prognos_report::upload::{validate_csv_file, HttpPredictionService, UploadGate};

#[derive(Parser)]
#[command(name = "prognos_report")]
#[command(about = "Patient risk prediction upload and ROI reporting")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a CSV declares every required column
    Validate {
        csv: PathBuf,
    },
    
    /// Upload a CSV to the prediction service and write the reports
    Analyze {
        csv: PathBuf,
        
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        
        /// Prediction endpoint, overrides the config file
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    
    /// Write the reports from a saved prediction response
    Report {
        payload: PathBuf,
        
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    
    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
    
    let mut config = Config::load(cli.config.as_deref())
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;
    
    match cli.command {
        Command::Validate { csv } => {
            let check = validate_csv_file(&csv)
                .with_context(|| format!("validating {:?}", csv))?;
            info!("{:?} declares all required fields ({} columns)", csv, check.headers.len());
        }
        Command::Analyze { csv, output, endpoint } => {
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
                config.validate()?;
            }
            
            let service = HttpPredictionService::new(&config.endpoint)?;
            info!("Using prediction endpoint {}", service.endpoint());
            let mut gate = UploadGate::new(config.reset_delay());
            gate.select_path(&csv)
                .with_context(|| format!("selecting {:?}", csv))?;
            
            let snapshot = match gate.submit(&service) {
                Ok(snapshot) => snapshot.clone(),
                Err(e) if e.is_validation() => bail!("{:?} rejected: {}", csv, e),
                Err(e) => {
                    error!("Something went wrong: {}", e);
                    return Err(e.into());
                }
            };
            write_reports(&snapshot, &config, &output)?;
        }
        Command::Report { payload, output } => {
            let payload = PredictionPayload::from_file(&payload)
                .with_context(|| format!("reading prediction response {:?}", payload))?;
            if payload.is_error() {
                bail!(
                    "prediction response reports an error: {}",
                    payload.message.as_deref().unwrap_or("no message")
                );
            }
            write_reports(&payload.into_snapshot(), &config, &output)?;
        }
    }
    
    Ok(())
}

fn write_reports(snapshot: &AnalysisSnapshot, config: &Config, output_dir: &Path) -> anyhow::Result<()> {
    info!(
        "Aggregating {} predictions and {} ROI records",
        snapshot.predictions.len(),
        snapshot.roi_data.len()
    );
    if snapshot.is_empty() {
        warn!("Prediction response contained no records");
    }
    
    let summary = DashboardSummary::from_snapshot(snapshot, config.top_risk_factors);
    let document = ReportDocument::compile(snapshot, Local::now());
    
    // Create output directory if it doesn't exist
    std::fs::create_dir_all(output_dir)?;
    
    let written = output::save_results(&summary, &document, config, output_dir)?;
    info!("Wrote {} files to {:?}", written.len(), output_dir);
    info!(
        "Hospital savings: ${:.2} ({}%), average per patient: ${}",
        summary.hospital_totals.savings,
        summary.hospital_totals.savings_percent,
        summary.hospital_totals.rounded_average_savings()
    );
    Ok(())
}
