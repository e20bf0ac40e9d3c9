//! Financial report pipeline
//!
//! This crate turns PDF financial statements into ratio records and market
//! commentary. It includes:
//!
//! - Extraction of reported figures from a PDF by a hosted model
//! - A pure ratio engine (profitability, liquidity, leverage, efficiency)
//! - Market benchmarking with search grounding and an ungrounded fallback
//! - A sequential batch orchestrator with JSON persistence
//!
//! # Architecture
//!
//! Only the ratio engine is local logic. Both model boundaries take an
//! `Arc<dyn LLMProvider>` so tests and callers can swap the backend:
//! - `FinancialExtractor`: PDF → loosely typed mapping (`ExtractedFinancials`)
//! - `ratios::compute`: `RawFinancials` → `RatioRecord`
//! - `MarketAnalyzer`: `RatioRecord` → `AnalysisRecord`
//! - `BatchOrchestrator`: glob → extract → compute → analyze, one document at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use finlens_llm::providers::GeminiProvider;
//! use finlens_report::{
//!     BatchOrchestrator, FinancialExtractor, MarketAnalyzer, PipelineConfig, default_registry,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(GeminiProvider::from_env()?);
//!     let prompts = Arc::new(default_registry()?);
//!     let config = Arc::new(PipelineConfig::default());
//!
//!     let orchestrator = BatchOrchestrator::new(
//!         Arc::new(FinancialExtractor::new(provider.clone(), prompts.clone(), config.clone())),
//!         Arc::new(MarketAnalyzer::new(provider, prompts, config)),
//!     );
//!
//!     let report = orchestrator.run("PDF_files/*.pdf").await?;
//!     finlens_report::persist(
//!         &report.aggregate,
//!         "company_ratios.json".as_ref(),
//!         "ai_market_analysis.json".as_ref(),
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod extraction;
pub mod financials;
pub mod market;
mod model_output;
pub mod prompts;
pub mod ratios;

// Re-export main types for convenience
pub use analysis::AnalysisRecord;
pub use batch::{
    ANALYSES_FILE, BatchOrchestrator, BatchReport, ComputationFailure, DocumentFailure,
    ExtractionEntry, ExtractionFailure, OutputAggregate, RATIOS_FILE, RatioEntry, SUMMARY_FILE,
    persist, write_json,
};
pub use config::{DocumentTransport, PipelineConfig};
pub use error::{ReportError, Result};
pub use extraction::FinancialExtractor;
pub use financials::{ExtractedFinancials, ProfitAndLoss, RawFinancials};
pub use market::MarketAnalyzer;
pub use prompts::{default_registry, register_prompts};
pub use ratios::RatioRecord;
