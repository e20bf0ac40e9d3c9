//! Market analysis boundary with a search-grounded first tier

use crate::analysis::AnalysisRecord;
use crate::config::PipelineConfig;
use crate::error::{ReportError, Result};
use crate::extraction::bounded;
use crate::model_output::parse_json_object;
use crate::prompts;
use crate::ratios::RatioRecord;
use finlens_llm::{BuiltinTool, CompletionRequest, LLMProvider, Message};
use finlens_prompt::PromptRegistry;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Asks the model to benchmark a company's ratios against its market
///
/// The first tier enables live search grounding; when it fails for any reason
/// (transport, quota, timeout, unusable output) the same prompt is retried
/// exactly once without grounding. Records are stamped with
/// `grounding_enabled` / `search_performed` so callers can tell the tiers apart.
pub struct MarketAnalyzer {
    provider: Arc<dyn LLMProvider>,
    prompts: Arc<PromptRegistry>,
    config: Arc<PipelineConfig>,
}

impl MarketAnalyzer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptRegistry>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            provider,
            prompts,
            config,
        }
    }

    /// Analyze, turning a total failure into a failure record
    pub async fn analyze(&self, ratios: &RatioRecord) -> AnalysisRecord {
        match self.try_analyze(ratios).await {
            Ok(record) => record,
            Err(ReportError::Analysis { company, message }) => {
                AnalysisRecord::failure(company, message)
            }
            Err(other) => AnalysisRecord::failure(ratios.company.clone(), other),
        }
    }

    /// Analyze, reporting a total failure as [`ReportError::Analysis`]
    #[instrument(skip(self, ratios), fields(company = %ratios.company))]
    pub async fn try_analyze(&self, ratios: &RatioRecord) -> Result<AnalysisRecord> {
        let prompt = self
            .prompts
            .render(prompts::MARKET_ANALYSIS, &serde_json::json!({ "ratios": ratios }))?;

        if self.config.grounding {
            info!("Requesting grounded market analysis");
            match self.request(&prompt, true, &ratios.company).await {
                Ok(record) => return Ok(record),
                Err(reason) => warn!("Grounded analysis failed, retrying without search: {reason}"),
            }
        }

        info!("Requesting market analysis without search");
        self.request(&prompt, false, &ratios.company)
            .await
            .map_err(|message| {
                warn!("Market analysis failed: {message}");
                ReportError::Analysis {
                    company: ratios.company.clone(),
                    message,
                }
            })
    }

    /// One analysis call; the error is a human-readable reason
    async fn request(
        &self,
        prompt: &str,
        grounded: bool,
        company: &str,
    ) -> std::result::Result<AnalysisRecord, String> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .add_message(Message::user(prompt))
            .temperature(self.config.analysis_temperature);
        // Search grounding does not combine with a JSON response format
        builder = if grounded {
            builder.tool(BuiltinTool::GoogleSearch)
        } else {
            builder.json()
        };
        if let Some(max_tokens) = self.config.max_output_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let response = bounded(
            "market analysis",
            self.config.call_timeout,
            self.provider.complete(builder.build()),
        )
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

        if !response.search_queries.is_empty() {
            debug!(queries = ?response.search_queries, "Grounding searches performed");
        }

        let text = response
            .message
            .text()
            .ok_or_else(|| "model returned no text".to_string())?;
        let map = parse_json_object(&text)?;

        let mut record = AnalysisRecord::from_value(serde_json::Value::Object(map))
            .ok_or_else(|| "analysis is not an object".to_string())?;
        record.ensure_company(company);
        record.annotate(grounded);
        Ok(record)
    }
}
