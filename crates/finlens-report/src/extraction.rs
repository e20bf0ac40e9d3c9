//! Extraction boundary: PDF in, loosely typed figures out

use crate::config::{DocumentTransport, PipelineConfig};
use crate::error::{ReportError, Result};
use crate::financials::ExtractedFinancials;
use crate::model_output::parse_json_object;
use crate::prompts;
use finlens_llm::{
    CompletionRequest, ContentBlock, FileStore, LLMProvider, Message, PDF_MIME_TYPE,
};
use finlens_prompt::PromptRegistry;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Asks the model to read a financial report
///
/// One call per document at the configured extraction temperature, with a
/// JSON response format. With [`DocumentTransport::Upload`] the PDF goes through
/// the provider's file store and is deleted afterwards whatever the outcome.
pub struct FinancialExtractor {
    provider: Arc<dyn LLMProvider>,
    files: Option<Arc<dyn FileStore>>,
    prompts: Arc<PromptRegistry>,
    config: Arc<PipelineConfig>,
}

impl FinancialExtractor {
    /// Create an extractor using inline transport unless configured otherwise
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<PromptRegistry>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            provider,
            files: None,
            prompts,
            config,
        }
    }

    /// Attach the file store used by the upload transport
    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Extract figures from a document, identified by its path
    pub async fn extract(&self, path: &Path) -> Result<ExtractedFinancials> {
        let source_file = path.display().to_string();
        self.extract_as(path, &source_file).await
    }

    /// Extract figures from a document, reporting it under `source_file`
    #[instrument(skip(self, path), fields(transport = %self.config.transport))]
    pub async fn extract_as(&self, path: &Path, source_file: &str) -> Result<ExtractedFinancials> {
        info!("Extracting financial data");
        let prompt = self.prompts.render(prompts::EXTRACTION, &serde_json::json!({}))?;

        let text = match self.config.transport {
            DocumentTransport::Inline => {
                let bytes = tokio::fs::read(path).await?;
                debug!(bytes = bytes.len(), "Sending document inline");
                self.generate(prompt, ContentBlock::pdf_bytes(&bytes), source_file)
                    .await?
            }
            DocumentTransport::Upload => self.generate_uploaded(prompt, path, source_file).await?,
        };

        let fields = parse_json_object(&text).map_err(|message| ReportError::Extraction {
            source_file: source_file.to_string(),
            message,
            raw_output: Some(text.clone()),
        })?;

        let extracted = ExtractedFinancials::new(source_file, fields);
        info!(company = extracted.company(), "Extraction complete");
        Ok(extracted)
    }

    async fn generate_uploaded(
        &self,
        prompt: String,
        path: &Path,
        source_file: &str,
    ) -> Result<String> {
        let files = self.files.as_ref().ok_or_else(|| {
            ReportError::Config("upload transport requires a file store".to_string())
        })?;

        let uploaded = bounded(
            "document upload",
            self.config.call_timeout,
            files.upload(path, PDF_MIME_TYPE),
        )
        .await?
        .map_err(|e| ReportError::extraction(source_file, e))?;

        let result = self
            .generate(prompt, ContentBlock::pdf_file(&uploaded.uri), source_file)
            .await;

        match bounded(
            "document delete",
            self.config.call_timeout,
            files.delete(&uploaded),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(file = %uploaded.name, "Failed to delete uploaded document: {e}"),
            Err(e) => warn!(file = %uploaded.name, "Failed to delete uploaded document: {e}"),
        }

        result
    }

    async fn generate(
        &self,
        prompt: String,
        document: ContentBlock,
        source_file: &str,
    ) -> Result<String> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .add_message(Message::user_blocks(vec![
                ContentBlock::text(prompt),
                document,
            ]))
            .temperature(self.config.extraction_temperature)
            .json();
        if let Some(max_tokens) = self.config.max_output_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let response = bounded(
            "extraction",
            self.config.call_timeout,
            self.provider.complete(builder.build()),
        )
        .await?
        .map_err(|e| ReportError::extraction(source_file, e))?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Extraction response received"
        );

        response
            .message
            .text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ReportError::Extraction {
                source_file: source_file.to_string(),
                message: "model returned no text".to_string(),
                raw_output: None,
            })
    }
}

/// Run an external call under a time budget
///
/// The outer error is the budget running out; the inner one is the call's own.
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<finlens_llm::Result<T>>
where
    F: Future<Output = finlens_llm::Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| ReportError::Timeout {
            operation,
            elapsed: limit,
        })
}


#[cfg(test)]
mod tests {
    use super::test_support::{RecordingFileStore, ScriptedProvider};
    use super::*;
    use crate::prompts::default_registry;
    use finlens_llm::{DocumentSource, LLMError, MessageContent, ResponseFormat};
    use std::io::Write;

    const ACME_JSON: &str = r#"{"company": "Acme Ltd", "net_worth": 1000, "liabilities": 400,
        "equity": 600, "profit_and_loss": {"total_revenue": 2000, "total_expenses": 1700,
        "net_profit_or_loss": 300}}"#;

    fn pdf_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.7 test").unwrap();
        file
    }

    fn extractor(
        provider: Arc<ScriptedProvider>,
        config: PipelineConfig,
    ) -> FinancialExtractor {
        FinancialExtractor::new(
            provider,
            Arc::new(default_registry().unwrap()),
            Arc::new(config),
        )
    }

    fn document_source(request: &CompletionRequest) -> DocumentSource {
        match &request.messages[0].content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .find_map(|b| match b {
                    ContentBlock::Document { source } => Some(source.clone()),
                    ContentBlock::Text { .. } => None,
                })
                .unwrap(),
            other => panic!("Expected blocks, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_inline_extraction() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(ACME_JSON.to_string())]));
        let extractor = extractor(provider.clone(), PipelineConfig::default());
        let pdf = pdf_file();

        let extracted = extractor.extract_as(pdf.path(), "acme.pdf").await.unwrap();

        assert_eq!(extracted.company(), "Acme Ltd");
        assert_eq!(extracted.source_file, "acme.pdf");

        let request = provider.request(0);
        assert_eq!(request.model, "gemini-2.5-pro");
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.response_format, ResponseFormat::Json);
        assert!(!request.is_grounded());
        assert!(matches!(document_source(&request), DocumentSource::Base64 { .. }));
        assert!(
            request.messages[0]
                .text()
                .unwrap()
                .contains("financial data extraction assistant")
        );
    }

    #[tokio::test]
    async fn test_extract_uses_path_as_source_file() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(ACME_JSON.to_string())]));
        let extractor = extractor(provider, PipelineConfig::default());
        let pdf = pdf_file();

        let extracted = extractor.extract(pdf.path()).await.unwrap();
        assert_eq!(extracted.source_file, pdf.path().display().to_string());
    }

    #[tokio::test]
    async fn test_fenced_output_is_accepted() {
        let fenced = format!("```json\n{ACME_JSON}\n```");
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(fenced)]));
        let extractor = extractor(provider, PipelineConfig::default());
        let pdf = pdf_file();

        let extracted = extractor.extract(pdf.path()).await.unwrap();
        assert_eq!(extracted.company(), "Acme Ltd");
    }

    #[tokio::test]
    async fn test_non_json_output_keeps_raw_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "I could not read this document.".to_string()
        )]));
        let extractor = extractor(provider, PipelineConfig::default());
        let pdf = pdf_file();

        let err = extractor.extract_as(pdf.path(), "bad.pdf").await.unwrap_err();
        assert_eq!(err.raw_output(), Some("I could not read this document."));
        assert!(matches!(err, ReportError::Extraction { ref source_file, .. } if source_file == "bad.pdf"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_extraction_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            LLMError::RateLimitExceeded("quota".to_string()),
        )]));
        let extractor = extractor(provider, PipelineConfig::default());
        let pdf = pdf_file();

        let err = extractor.extract(pdf.path()).await.unwrap_err();
        assert!(matches!(err, ReportError::Extraction { .. }));
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let extractor = extractor(provider.clone(), PipelineConfig::default());

        let err = extractor
            .extract(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_transport_deletes_after_success() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(ACME_JSON.to_string())]));
        let files = Arc::new(RecordingFileStore::default());
        let config = PipelineConfig::builder()
            .transport(DocumentTransport::Upload)
            .build()
            .unwrap();
        let extractor = extractor(provider.clone(), config).with_file_store(files.clone());
        let pdf = pdf_file();

        extractor.extract(pdf.path()).await.unwrap();

        assert_eq!(files.uploads.lock().unwrap().len(), 1);
        assert_eq!(*files.deletes.lock().unwrap(), vec!["files/0".to_string()]);
        match document_source(&provider.request(0)) {
            DocumentSource::File { uri, .. } => assert_eq!(uri, "https://files.test/files/0"),
            other => panic!("Expected file reference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_transport_deletes_after_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(LLMError::RequestFailed(
            "boom".to_string(),
        ))]));
        let files = Arc::new(RecordingFileStore::default());
        let config = PipelineConfig::builder()
            .transport(DocumentTransport::Upload)
            .build()
            .unwrap();
        let extractor = extractor(provider, config).with_file_store(files.clone());
        let pdf = pdf_file();

        assert!(extractor.extract(pdf.path()).await.is_err());
        assert_eq!(files.deletes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_generation() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(ACME_JSON.to_string())]));
        let files = Arc::new(RecordingFileStore {
            fail_upload: true,
            ..Default::default()
        });
        let config = PipelineConfig::builder()
            .transport(DocumentTransport::Upload)
            .build()
            .unwrap();
        let extractor = extractor(provider.clone(), config).with_file_store(files.clone());
        let pdf = pdf_file();

        assert!(extractor.extract(pdf.path()).await.is_err());
        assert_eq!(provider.request_count(), 0);
        assert!(files.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_transport_without_store_is_config_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let config = PipelineConfig::builder()
            .transport(DocumentTransport::Upload)
            .build()
            .unwrap();
        let extractor = extractor(provider, config);
        let pdf = pdf_file();

        let err = extractor.extract(pdf.path()).await.unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let err = bounded("extraction", Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, LLMError>(())
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "extraction timed out after 5s");
    }
}
