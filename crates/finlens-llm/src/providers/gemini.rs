//! Google Gemini provider implementation
//!
//! This module implements [`LLMProvider`] and [`FileStore`] against the Gemini
//! REST API (`generateContent` and the Files API).
//! See: https://ai.google.dev/api/generate-content
//!
//! # Examples
//!
//! ```no_run
//! use finlens_llm::{CompletionRequest, ContentBlock, LLMProvider, Message};
//! use finlens_llm::providers::{GeminiConfig, GeminiProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeminiConfig::new("AIza...")
//!         .with_timeout(120)
//!         .with_requests_per_minute(10);
//!     let provider = GeminiProvider::with_config(config)?;
//!
//!     let pdf = std::fs::read("report.pdf")?;
//!     let request = CompletionRequest::builder("gemini-2.5-pro")
//!         .add_message(Message::user_blocks(vec![
//!             ContentBlock::text("Extract the company name as JSON."),
//!             ContentBlock::pdf_bytes(&pdf),
//!         ]))
//!         .temperature(0.0)
//!         .json()
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::{
    BuiltinTool, CompletionRequest, CompletionResponse, ContentBlock, DocumentSource, FileStore,
    LLMError, LLMProvider, Message, MessageContent, Result, Role, StopReason, TokenUsage,
    UploadedFile,
};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const FILE_ACTIVE_POLL_ATTEMPTS: u32 = 10;
const FILE_ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(1);

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL (default: "https://generativelanguage.googleapis.com")
    pub api_base: String,

    /// Request timeout in seconds (default: 300)
    pub timeout_secs: u64,

    /// Client-side request budget; unlimited when None
    pub requests_per_minute: Option<NonZeroU32>,
}

impl GeminiConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `GEMINI_API_KEY` and, optionally, the base URL
    /// from `GEMINI_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError("GEMINI_API_KEY environment variable not set".to_string())
        })?;

        let api_base = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string());

        Ok(Self::new(api_key).with_api_base(api_base))
    }

    /// Set custom API base URL (proxies, regional endpoints, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Limit outgoing requests per minute; 0 disables the limit
    pub fn with_requests_per_minute(mut self, requests: u32) -> Self {
        self.requests_per_minute = NonZeroU32::new(requests);
        self
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            requests_per_minute: None,
        }
    }
}

/// Gemini provider
///
/// Supports the Gemini model family (gemini-2.5-pro, gemini-2.5-flash, ...) with
/// PDF input, JSON response mode and Google Search grounding.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    rate_limiter: Option<SharedRateLimiter>,
}

impl GeminiProvider {
    /// Create a new Gemini provider with custom configuration
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(config.timeout()).build()?;

        let rate_limiter = config
            .requests_per_minute
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Create a new Gemini provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(GeminiConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{API_VERSION}/{path}", self.config.api_base)
    }

    fn transport_error(&self, err: reqwest::Error) -> LLMError {
        if err.is_timeout() {
            LLMError::Timeout(self.config.timeout())
        } else {
            LLMError::HttpError(err)
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response> {
        self.throttle().await;
        builder
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))
    }

    async fn fetch_file(&self, name: &str) -> Result<GeminiFile> {
        let response = self.send(self.client.get(self.endpoint(name))).await?;
        let response = check_status(response, name).await?;
        response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse file: {e}")))
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model, grounded = request.is_grounded()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API at {}", self.config.api_base);

        let model = request.model.clone();
        let body = build_gemini_request(request);

        let response = self
            .send(
                self.client
                    .post(self.endpoint(&format!("models/{model}:generateContent")))
                    .json(&body),
            )
            .await?;
        let response = check_status(response, &model).await?;

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        parse_gemini_response(gemini_response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[async_trait]
impl FileStore for GeminiProvider {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .map_or_else(|| "document".to_string(), |n| n.to_string_lossy().into_owned());

        // Resumable protocol: a start request returns the session URL, the
        // bytes go to that URL in a single upload+finalize request.
        let start = self
            .send(
                self.client
                    .post(format!(
                        "{}/upload/{API_VERSION}/files",
                        self.config.api_base
                    ))
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", bytes.len())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type)
                    .json(&serde_json::json!({ "file": { "display_name": display_name } })),
            )
            .await?;
        let start = check_status(start, "files").await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                LLMError::UnexpectedResponse("Upload session URL missing".to_string())
            })?;

        let size = bytes.len();
        let finished = self
            .send(
                self.client
                    .post(upload_url)
                    .header("X-Goog-Upload-Offset", "0")
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .body(bytes),
            )
            .await?;
        let finished = check_status(finished, "files").await?;

        let envelope: GeminiFileEnvelope = finished.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse uploaded file: {e}"))
        })?;
        let mut file = envelope.file;
        debug!(name = %file.name, size, "Uploaded document");

        let mut attempts = 0;
        while file.state.as_deref() == Some("PROCESSING") && attempts < FILE_ACTIVE_POLL_ATTEMPTS {
            tokio::time::sleep(FILE_ACTIVE_POLL_INTERVAL).await;
            file = self.fetch_file(&file.name).await?;
            attempts += 1;
        }
        let ready = check_file_ready(&file);
        let uploaded = UploadedFile {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        };
        if let Err(e) = ready {
            if let Err(cleanup) = self.delete(&uploaded).await {
                warn!(name = %uploaded.name, "Failed to delete unusable upload: {cleanup}");
            }
            return Err(e);
        }

        Ok(uploaded)
    }

    #[instrument(skip(self), fields(name = %file.name))]
    async fn delete(&self, file: &UploadedFile) -> Result<()> {
        let response = self
            .send(self.client.delete(self.endpoint(&file.name)))
            .await?;
        check_status(response, &file.name).await?;
        debug!("Deleted uploaded document");
        Ok(())
    }
}

/// Map a non-success HTTP status onto the error taxonomy
async fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(map_status(status, resource, error_text))
}

fn map_status(status: StatusCode, resource: &str, error_text: String) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(error_text),
        400 => LLMError::InvalidRequest(error_text),
        404 => LLMError::ModelNotFound(resource.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
    }
}

// ============================================================================
// Gemini-specific request types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
    /// Set on reasoning summaries; never part of the answer
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
            file_data: None,
            thought: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

// ============================================================================
// Gemini-specific response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    web_search_queries: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiFileEnvelope {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// An uploaded file can be referenced only once it has left `PROCESSING`
fn check_file_ready(file: &GeminiFile) -> Result<()> {
    match file.state.as_deref() {
        Some("FAILED") => Err(LLMError::RequestFailed(format!(
            "Provider failed to process {}",
            file.name
        ))),
        Some("PROCESSING") => Err(LLMError::RequestFailed(format!(
            "File {} not ready after {} polls",
            file.name, FILE_ACTIVE_POLL_ATTEMPTS
        ))),
        _ => Ok(()),
    }
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build a Gemini request from our generic format
///
/// Key difference from chat-style APIs: the system prompt travels separately as
/// `systemInstruction` and the assistant role is called "model".
fn build_gemini_request(request: CompletionRequest) -> GeminiRequest {
    let system_instruction = request.system.map(|sys| GeminiContent {
        role: None,
        parts: vec![GeminiPart::text(sys)],
    });

    let contents = request.messages.into_iter().map(convert_message).collect();

    let tools = request
        .tools
        .unwrap_or_default()
        .into_iter()
        .map(|tool| match tool {
            BuiltinTool::GoogleSearch => GeminiTool {
                google_search: serde_json::Map::new(),
            },
        })
        .collect();

    GeminiRequest {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            response_mime_type: request.response_format.mime_type(),
        },
        tools,
    }
}

fn convert_message(msg: Message) -> GeminiContent {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "model",
    };

    let parts = match msg.content {
        Some(MessageContent::Text(text)) => vec![GeminiPart::text(text)],
        Some(MessageContent::Blocks(blocks)) => blocks.into_iter().map(convert_block).collect(),
        None => vec![GeminiPart::text(String::new())],
    };

    GeminiContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn convert_block(block: ContentBlock) -> GeminiPart {
    match block {
        ContentBlock::Text { text } => GeminiPart::text(text),
        ContentBlock::Document {
            source: DocumentSource::Base64 { media_type, data },
        } => GeminiPart {
            text: None,
            inline_data: Some(InlineData {
                mime_type: media_type,
                data,
            }),
            file_data: None,
            thought: None,
        },
        ContentBlock::Document {
            source: DocumentSource::File { media_type, uri },
        } => GeminiPart {
            text: None,
            inline_data: None,
            file_data: Some(FileData {
                mime_type: media_type,
                file_uri: uri,
            }),
            thought: None,
        },
    }
}

/// Parse a Gemini response into our format
fn parse_gemini_response(response: GeminiResponse) -> Result<CompletionResponse> {
    let usage = response.usage_metadata.unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(LLMError::EmptyResponse(reason));
    };

    let stop_reason = map_stop_reason(candidate.finish_reason.as_deref().unwrap_or("STOP"));

    let blocks: Vec<ContentBlock> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| part.thought != Some(true))
        .filter_map(|part| part.text.map(|text| ContentBlock::Text { text }))
        .collect();

    if blocks.is_empty() {
        return Err(LLMError::EmptyResponse(format!(
            "candidate finished with {stop_reason:?} and no text"
        )));
    }

    let search_queries = candidate
        .grounding_metadata
        .map(|g| g.web_search_queries)
        .unwrap_or_default();

    debug!(
        "Received response - stop_reason: {:?}, tokens: {}/{}, search queries: {}",
        stop_reason,
        usage.prompt_token_count,
        usage.candidates_token_count,
        search_queries.len()
    );

    Ok(CompletionResponse {
        message: Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(blocks)),
        },
        stop_reason,
        usage: TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
        search_queries,
    })
}

/// Map Gemini finish reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "STOP" => StopReason::EndTurn,
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            StopReason::Safety
        }
        _ => {
            warn!("Unknown finish reason: {}", reason);
            StopReason::Other
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key");
        assert!(provider.is_ok());
        let provider = provider.unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(
            provider.config().api_base,
            "https://generativelanguage.googleapis.com"
        );
        assert!(provider.rate_limiter.is_none());
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiProvider::new("  ");
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::new("test-key")
            .with_api_base("http://localhost:8080/")
            .with_timeout(60)
            .with_requests_per_minute(5);

        assert_eq!(config.api_base, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.requests_per_minute, NonZeroU32::new(5));

        let provider = GeminiProvider::with_config(config).unwrap();
        assert!(provider.rate_limiter.is_some());
        assert_eq!(
            provider.endpoint("models/gemini-2.5-pro:generateContent"),
            "http://localhost:8080/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_zero_requests_per_minute_disables_limit() {
        let config = GeminiConfig::new("k").with_requests_per_minute(0);
        assert!(config.requests_per_minute.is_none());
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let provider = GeminiProvider::new("test-key").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = provider
            .upload(&dir.path().join("missing.pdf"), crate::PDF_MIME_TYPE)
            .await;
        assert!(matches!(result, Err(LLMError::Io(_))));
    }

    #[test]
    fn test_document_request_conversion() {
        let request = CompletionRequest::builder("gemini-2.5-pro")
            .add_message(Message::user_blocks(vec![
                ContentBlock::text("Extract"),
                ContentBlock::pdf_bytes(b"%PDF"),
                ContentBlock::pdf_file("https://files/abc"),
            ]))
            .temperature(0.0)
            .json()
            .build();

        let body = serde_json::to_value(build_gemini_request(request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Extract");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[1]["inlineData"]["data"], "JVBERg==");
        assert_eq!(parts[2]["fileData"]["fileUri"], "https://files/abc");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_grounded_request_conversion() {
        let request = CompletionRequest::builder("gemini-2.5-pro")
            .system("You are a financial analyst")
            .add_message(Message::user("Analyze"))
            .add_message(Message::assistant("{}"))
            .tool(BuiltinTool::GoogleSearch)
            .build();

        let body = serde_json::to_value(build_gemini_request(request)).unwrap();

        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a financial analyst"
        );
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["responseMimeType"], "text/plain");
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "{\"company\":" },
                        { "text": " \"Acme\"}" }
                    ]
                },
                "finishReason": "STOP",
                "groundingMetadata": { "webSearchQueries": ["acme sector margins"] }
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 30 }
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let parsed = parse_gemini_response(response).unwrap();

        assert_eq!(parsed.message.text().as_deref(), Some("{\"company\": \"Acme\"}"));
        assert_eq!(parsed.stop_reason, StopReason::EndTurn);
        assert_eq!(parsed.usage.total(), 150);
        assert_eq!(parsed.search_queries, vec!["acme sector margins".to_string()]);
    }

    #[test]
    fn test_blocked_prompt_is_empty_response() {
        let raw = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let result = parse_gemini_response(response);
        assert!(matches!(result, Err(LLMError::EmptyResponse(reason)) if reason == "SAFETY"));
    }

    #[test]
    fn test_candidate_without_text_is_empty_response() {
        let raw = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            parse_gemini_response(response),
            Err(LLMError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("STOP"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("SAFETY"), StopReason::Safety);
        assert_eq!(map_stop_reason("RECITATION"), StopReason::Safety);
        assert_eq!(map_stop_reason("MALFORMED_FUNCTION_CALL"), StopReason::Other);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "m", String::new()),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "m", String::new()),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "m", "quota".to_string()),
            LLMError::RateLimitExceeded(msg) if msg == "quota"
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "gemini-x", String::new()),
            LLMError::ModelNotFound(model) if model == "gemini-x"
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "m", "upstream".to_string()),
            LLMError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_uploaded_file_parsing() {
        let raw = json!({
            "file": {
                "name": "files/abc-123",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
                "mimeType": "application/pdf",
                "state": "ACTIVE"
            }
        });
        let envelope: GeminiFileEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.file.name, "files/abc-123");
        assert_eq!(envelope.file.state.as_deref(), Some("ACTIVE"));
        assert!(check_file_ready(&envelope.file).is_ok());
    }

    #[test]
    fn test_file_still_processing_is_not_ready() {
        let file = |state: Option<&str>| GeminiFile {
            name: "files/abc-123".to_string(),
            uri: "https://files.test/abc-123".to_string(),
            mime_type: None,
            state: state.map(str::to_string),
        };

        let err = check_file_ready(&file(Some("PROCESSING"))).unwrap_err();
        assert!(matches!(err, LLMError::RequestFailed(ref m) if m.contains("not ready")));
        assert!(matches!(
            check_file_ready(&file(Some("FAILED"))),
            Err(LLMError::RequestFailed(_))
        ));
        assert!(check_file_ready(&file(None)).is_ok());
    }
}
