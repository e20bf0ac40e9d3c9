//! Batch processing of a directory of reports

use crate::analysis::AnalysisRecord;
use crate::error::{ReportError, Result};
use crate::extraction::FinancialExtractor;
use crate::financials::ExtractedFinancials;
use crate::market::MarketAnalyzer;
use crate::ratios::{self, RatioRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Default file name for the ratio output
pub const RATIOS_FILE: &str = "company_ratios.json";

/// Default file name for the market analysis output
pub const ANALYSES_FILE: &str = "ai_market_analysis.json";

/// Default file name for the extraction-only output
pub const SUMMARY_FILE: &str = "financial_summary.json";

/// Ratios could not be computed for a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputationFailure {
    pub company: String,
    pub source_file: String,
    pub error: String,
}

/// One element of the persisted ratio array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RatioEntry {
    Record(RatioRecord),
    Failure(ComputationFailure),
}

impl RatioEntry {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Everything a batch run persists
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputAggregate {
    pub ratios: Vec<RatioEntry>,
    pub analyses: Vec<AnalysisRecord>,
}

/// A document that was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentFailure {
    pub source_file: String,
    pub error: String,
}

/// Outcome of [`BatchOrchestrator::run`]
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub aggregate: OutputAggregate,
    pub failures: Vec<DocumentFailure>,
    pub documents_found: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Documents whose figures were extracted
    pub fn extracted(&self) -> usize {
        self.documents_found - self.failures.len()
    }

    /// Companies with a computed ratio record
    pub fn companies_analyzed(&self) -> usize {
        self.aggregate
            .ratios
            .iter()
            .filter(|entry| !entry.is_failure())
            .count()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// A document that failed extraction, as persisted by [`BatchOrchestrator::extract_all`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionFailure {
    pub source_file: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// One element of the extraction-only output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionEntry {
    Extracted(ExtractedFinancials),
    Failed(ExtractionFailure),
}

/// Sequential extract → ratios → analysis over a set of documents
///
/// A failing document never stops the run: extraction failures are recorded in
/// [`BatchReport::failures`], computation failures become a [`RatioEntry::Failure`]
/// and skip the analysis step.
pub struct BatchOrchestrator {
    extractor: Arc<FinancialExtractor>,
    analyzer: Arc<MarketAnalyzer>,
}

impl BatchOrchestrator {
    pub fn new(extractor: Arc<FinancialExtractor>, analyzer: Arc<MarketAnalyzer>) -> Self {
        Self {
            extractor,
            analyzer,
        }
    }

    /// Documents matching a glob pattern, sorted
    pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(pattern)
            .map_err(|e| ReportError::Config(format!("invalid pattern {pattern:?}: {e}")))?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable path: {e}"),
            }
        }
        paths.sort();

        if paths.is_empty() {
            warn!(pattern, "No documents found");
        } else {
            info!(pattern, count = paths.len(), "Found documents");
        }
        Ok(paths)
    }

    /// Run the full pipeline over every matching document
    #[instrument(skip(self))]
    pub async fn run(&self, pattern: &str) -> Result<BatchReport> {
        let started_at = Utc::now();
        let paths = Self::discover(pattern)?;

        let mut aggregate = OutputAggregate::default();
        let mut failures = Vec::new();

        for path in &paths {
            let source_file = path.display().to_string();
            info!(document = %source_file, "Processing document");

            let extracted = match self.extractor.extract(path).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!(document = %source_file, "Skipping document: {e}");
                    failures.push(DocumentFailure {
                        source_file,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let record = match extracted.decode().map(|raw| ratios::compute(&raw)) {
                Ok(record) => record,
                Err(e) => {
                    warn!(document = %source_file, "Cannot compute ratios: {e}");
                    aggregate
                        .ratios
                        .push(RatioEntry::Failure(ComputationFailure {
                            company: extracted.company().to_string(),
                            source_file,
                            error: e.to_string(),
                        }));
                    continue;
                }
            };

            let analysis = self.analyzer.analyze(&record).await;
            if analysis.is_failure() {
                warn!(company = %record.company, "Market analysis unavailable");
            } else {
                info!(
                    company = %record.company,
                    score = ?analysis.overall_health_score(),
                    grade = ?analysis.performance_grade(),
                    grounded = analysis.search_performed(),
                    "Market analysis complete"
                );
            }

            aggregate.ratios.push(RatioEntry::Record(record));
            aggregate.analyses.push(analysis);
        }

        let report = BatchReport {
            aggregate,
            failures,
            documents_found: paths.len(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            documents = report.documents_found,
            companies = report.companies_analyzed(),
            skipped = report.failures.len(),
            "Batch complete"
        );
        Ok(report)
    }

    /// Extraction only, one entry per matching document
    #[instrument(skip(self))]
    pub async fn extract_all(&self, pattern: &str) -> Result<Vec<ExtractionEntry>> {
        let paths = Self::discover(pattern)?;
        let mut entries = Vec::with_capacity(paths.len());

        for path in &paths {
            let entry = match self.extractor.extract(path).await {
                Ok(extracted) => ExtractionEntry::Extracted(extracted),
                Err(e) => {
                    warn!(document = %path.display(), "Extraction failed: {e}");
                    ExtractionEntry::Failed(ExtractionFailure {
                        source_file: path.display().to_string(),
                        raw_output: e.raw_output().map(str::to_string),
                        error: e.to_string(),
                    })
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Write the ratio and analysis arrays
pub fn persist(aggregate: &OutputAggregate, ratios_path: &Path, analyses_path: &Path) -> Result<()> {
    write_json(ratios_path, &aggregate.ratios)?;
    write_json(analyses_path, &aggregate.analyses)?;
    info!(
        ratios = %ratios_path.display(),
        analyses = %analyses_path.display(),
        "Results saved"
    );
    Ok(())
}

/// Write a value as 4-space indented UTF-8 JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    std::fs::write(path, buf)?;
    Ok(())
}
