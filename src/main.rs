use anyhow::Result;
use clap::Parser;
use floorplan_analyzer::app::FloorPlanAnalyzer;
use floorplan_analyzer::models::Config;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "floorplan-analyzer")]
#[command(about = "Analyse a floor plan against KPIs with an LLM gateway")]
struct CliArgs {
    /// Floor-plan image (PNG, JPEG, WebP or GIF).
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// KPI description the plan is assessed against.
    #[arg(long, value_parser = parse_kpi_arg)]
    kpi: String,

    /// Model name; defaults to LITELLM_MODEL.
    #[arg(long)]
    model: Option<String>,

    /// Wait for the complete answer instead of streaming it.
    #[arg(long)]
    no_stream: bool,
}

fn parse_kpi_arg(input: &str) -> std::result::Result<String, String> {
    let kpi = input.trim();
    if kpi.is_empty() {
        return Err("KPI description must not be empty".to_string());
    }
    Ok(kpi.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floorplan_analyzer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut analyzer = match FloorPlanAnalyzer::from_config(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            error!("Failed to initialize analyzer: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(model) = args.model {
        analyzer = analyzer.with_model(model);
    }
    if args.no_stream {
        analyzer = analyzer.with_stream(false);
    }

    info!("Analysing {}", args.image.display());

    let mut stdout = std::io::stdout();
    let result = analyzer
        .analyze_file_with(&args.image, &args.kpi, |fragment| {
            let _ = write!(stdout, "{}", fragment);
            let _ = stdout.flush();
        })
        .await;

    match result {
        Ok(analysis) => {
            println!();
            info!(
                "Analysis complete (finish reason: {})",
                analysis.finish_reason.as_deref().unwrap_or("none")
            );
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            std::process::exit(1);
        }
    }
}
