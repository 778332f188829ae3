use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use polymarket_analyst::analysis::analyst::{AnalysisError, Analyst};
use polymarket_analyst::analysis::pipeline;
use polymarket_analyst::ai::response::AnalysisResult;
use polymarket_analyst::config::{Config, EnvConfig};
use polymarket_analyst::data::gamma_api::MarketTarget;
use polymarket_analyst::data::types::NOT_AVAILABLE;

#[derive(Parser)]
#[command(name = "polymarket-analyst", about = "AI betting analysis for Polymarket events")]
struct Args {
    /// Polymarket event URL or slug
    target: Option<String>,

    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Skip the news/context lookup
    #[arg(long)]
    no_context: bool,

    /// Read the event JSON from a file instead of the market-data API
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Parse this reply file instead of calling the backend (needs --payload)
    #[arg(long, requires = "payload")]
    reply: Option<PathBuf>,

    /// Print the constructed prompt and exit
    #[arg(long)]
    prompt_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let file_config = if config_found {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    let mut config = file_config.apply_env(EnvConfig::load());
    if args.no_context {
        config.context.enabled = false;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.system.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !config_found {
        info!("No config at {}, using defaults", args.config.display());
    }
    info!("Market data: {}", config.endpoints.gamma_url);
    info!("Model: {} @ {}", config.llm.model, config.endpoints.ollama_url);
    info!("Context lookup: {}", config.context.enabled);

    if let Err(e) = run(&args, &config).await {
        if let Some(analysis_err) = e.downcast_ref::<AnalysisError>() {
            error!("{}", analysis_err);
            eprintln!("⚠️ {}", analysis_err.user_message());
        }
        return Err(e);
    }

    Ok(())
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let analyst = Analyst::from_config(config)?;

    let payload = match (&args.payload, &args.target) {
        (Some(path), _) => read_json(path)?,
        (None, Some(input)) => {
            let target = MarketTarget::parse(input)
                .ok_or_else(|| AnalysisError::InvalidSlug(input.clone()))?;
            info!("✅ {}", target.label());
            analyst.fetch(&target).await?
        }
        (None, None) => anyhow::bail!("Provide an event URL/slug or --payload FILE"),
    };

    if let Some(reply_path) = &args.reply {
        let prepared = pipeline::prepare(&payload, None).map_err(AnalysisError::from)?;
        let reply = std::fs::read_to_string(reply_path)
            .with_context(|| format!("Failed to read reply file: {}", reply_path.display()))?;

        println!("{}", prepared.report);
        print_result(&pipeline::finish(&reply));
        return Ok(());
    }

    if args.prompt_only {
        let prepared = analyst.prepare(&payload).await?;
        println!("{}", prepared.prompt);
        return Ok(());
    }

    let analysis = analyst.analyze_payload(&payload).await?;
    println!("{}", analysis.prepared.report);
    print_result(&analysis.result);

    Ok(())
}

fn print_result(result: &AnalysisResult) {
    println!("🤖 AI ANALYSIS\n{}\n", result.raw_text.trim());
    println!(
        "Confidence: {}",
        result
            .confidence_percent
            .map(|c| format!("{}%", c))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    );
    println!(
        "Risk: {}",
        result
            .risk_level
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    );
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse payload file: {}", path.display()))
}
