use autolysis::config::Config;
use autolysis::llm::LlmClient;
use autolysis::pipeline::AnalysisPipeline;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autolysis")]
#[command(about = "Automated exploratory analysis of a CSV file, narrated into README.md")]
#[command(version)]
struct Args {
    /// CSV file to analyze
    csv_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Analyzing {} with model {}", args.csv_file.display(), config.model);

    let narrator = Arc::new(LlmClient::from_config(&config)?);
    let pipeline = AnalysisPipeline::new(&config, narrator);
    let report = pipeline.run(&args.csv_file).await?;

    if !report.timed_out.is_empty() {
        info!("Stages left empty after timing out: {:?}", report.timed_out);
    }
    println!("Report written to {}", report.report_path.display());
    for chart in &report.charts {
        println!("Chart written to {}", chart.path.display());
    }

    Ok(())
}
