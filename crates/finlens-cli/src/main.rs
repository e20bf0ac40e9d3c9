//! Command-line interface for finlens

mod summary;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finlens_llm::providers::{GeminiConfig, GeminiProvider};
use finlens_report::financials::UNKNOWN_COMPANY;
use finlens_report::{
    ANALYSES_FILE, BatchOrchestrator, ComputationFailure, FinancialExtractor, MarketAnalyzer,
    PipelineConfig, RATIOS_FILE, RatioEntry, SUMMARY_FILE, default_registry, persist, ratios,
    write_json,
};
use finlens_utils::{Config, init_tracing};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PATTERN: &str = "PDF_files/*.pdf";

#[derive(Parser, Debug)]
#[command(name = "finlens", version)]
#[command(about = "Extract figures from financial PDFs, compute ratios and benchmark them", long_about = None)]
struct Cli {
    /// Model identifier
    #[arg(long, global = true, env = "FINLENS_MODEL")]
    model: Option<String>,

    /// How documents reach the model: inline or upload
    #[arg(long, global = true, env = "FINLENS_DOCUMENT_TRANSPORT")]
    transport: Option<String>,

    /// Budget for a single model call, in seconds
    #[arg(long, global = true, env = "FINLENS_REQUEST_TIMEOUT_SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract figures from every matching PDF
    Extract {
        /// Glob pattern for input documents
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,

        #[arg(short, long, default_value = SUMMARY_FILE)]
        output: PathBuf,
    },
    /// Extract, compute ratios and run market analysis for every matching PDF
    Analyze {
        /// Glob pattern for input documents
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,

        #[arg(long, default_value = RATIOS_FILE)]
        ratios_output: PathBuf,

        #[arg(long, default_value = ANALYSES_FILE)]
        analysis_output: PathBuf,

        /// Skip the search-grounded tier
        #[arg(long)]
        no_grounding: bool,
    },
    /// Compute ratios from a saved extraction summary, without model calls
    Ratios {
        #[arg(short, long, default_value = SUMMARY_FILE)]
        input: PathBuf,

        #[arg(short, long, default_value = RATIOS_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    init_tracing(config.log_format);

    if let Some(model) = &cli.model {
        config.model.clone_from(model);
    }
    if let Some(transport) = &cli.transport {
        config.document_transport = transport.to_ascii_lowercase();
    }
    if let Some(secs) = cli.timeout {
        anyhow::ensure!(secs > 0, "--timeout must be greater than zero");
        config.request_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Commands::Extract { pattern, output } => {
            let orchestrator = orchestrator(&config, true)?;
            let entries = orchestrator.extract_all(&pattern).await?;
            write_json(&output, &entries)?;
            println!(
                "Extracted {} document(s); results saved to {}",
                entries.len(),
                output.display()
            );
        }
        Commands::Analyze {
            pattern,
            ratios_output,
            analysis_output,
            no_grounding,
        } => {
            let orchestrator = orchestrator(&config, !no_grounding)?;
            let report = orchestrator.run(&pattern).await?;
            persist(&report.aggregate, &ratios_output, &analysis_output)?;

            if !report.aggregate.ratios.is_empty() {
                println!("{}", summary::ratio_table(&report.aggregate.ratios));
            }
            if !report.aggregate.analyses.is_empty() {
                println!("{}", summary::analysis_table(&report.aggregate.analyses));
            }
            for failure in &report.failures {
                println!("Skipped {}: {}", failure.source_file, failure.error);
            }
            println!(
                "Analyzed {} of {} document(s) in {:.1}s",
                report.companies_analyzed(),
                report.documents_found,
                report.elapsed().to_std().unwrap_or_default().as_secs_f64()
            );
            println!("Financial ratios saved to: {}", ratios_output.display());
            println!("Market analysis saved to: {}", analysis_output.display());
        }
        Commands::Ratios { input, output } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let entries: Vec<Value> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array", input.display()))?;

            let computed = ratio_entries(&entries);
            write_json(&output, &computed)?;
            println!("{}", summary::ratio_table(&computed));
            println!("Financial ratios saved to: {}", output.display());
        }
    }

    Ok(())
}

/// Gemini-backed batch pipeline
fn orchestrator(config: &Config, grounding: bool) -> anyhow::Result<BatchOrchestrator> {
    let mut gemini = GeminiConfig::new(config.require_api_key()?)
        .with_api_base(&config.gemini_api_base)
        .with_timeout(config.request_timeout.as_secs());
    if let Some(rpm) = config.requests_per_minute {
        gemini = gemini.with_requests_per_minute(rpm);
    }
    let provider = Arc::new(GeminiProvider::with_config(gemini)?);

    let pipeline = Arc::new(pipeline_config(config, grounding)?);
    let prompts = Arc::new(default_registry()?);
    info!(model = %pipeline.model, transport = %pipeline.transport, grounding, "Pipeline ready");

    let extractor = FinancialExtractor::new(provider.clone(), prompts.clone(), pipeline.clone())
        .with_file_store(provider.clone());
    let analyzer = MarketAnalyzer::new(provider, prompts, pipeline);
    Ok(BatchOrchestrator::new(
        Arc::new(extractor),
        Arc::new(analyzer),
    ))
}

/// Shared pipeline settings with the grounding choice of this run
fn pipeline_config(config: &Config, grounding: bool) -> finlens_report::Result<PipelineConfig> {
    let mut pipeline = PipelineConfig::from_env_config(config)?;
    pipeline.grounding = grounding;
    Ok(pipeline)
}

/// Ratio entries for every successfully extracted document in a summary
fn ratio_entries(entries: &[Value]) -> Vec<RatioEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let source_file = entry
                .get("source_file")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if entry.get("error").is_some() {
                warn!(document = %source_file, "Skipping failed extraction");
                return None;
            }
            Some(match ratios::compute_value(entry) {
                Ok(record) => RatioEntry::Record(record),
                Err(e) => RatioEntry::Failure(ComputationFailure {
                    company: entry
                        .get("company")
                        .and_then(Value::as_str)
                        .unwrap_or(UNKNOWN_COMPANY)
                        .to_string(),
                    source_file,
                    error: e.to_string(),
                }),
            })
        })
        .collect()
}
