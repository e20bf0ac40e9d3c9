//! Configuration for the report pipeline

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How a PDF reaches the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentTransport {
    /// Base64 bytes in the request body
    #[default]
    Inline,
    /// Uploaded to the provider's file store, referenced by URI, deleted afterwards
    Upload,
}

impl FromStr for DocumentTransport {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "upload" => Ok(Self::Upload),
            other => Err(ReportError::Config(format!(
                "unknown document transport '{other}' (expected inline or upload)"
            ))),
        }
    }
}

impl fmt::Display for DocumentTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inline => "inline",
            Self::Upload => "upload",
        })
    }
}

/// Configuration for extraction and market analysis calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model identifier for every call
    pub model: String,

    /// Sampling temperature of the extraction call
    pub extraction_temperature: f32,

    /// Sampling temperature of the analysis call
    pub analysis_temperature: f32,

    /// Output token cap; provider default when unset
    pub max_output_tokens: Option<usize>,

    /// Budget for one external call
    pub call_timeout: Duration,

    /// How documents reach the model
    pub transport: DocumentTransport,

    /// Try the search-grounded tier before the plain one
    pub grounding: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            extraction_temperature: 0.0,
            analysis_temperature: 0.3,
            max_output_tokens: None,
            call_timeout: Duration::from_secs(300),
            transport: DocumentTransport::Inline,
            grounding: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Derive pipeline settings from process configuration
    pub fn from_env_config(config: &finlens_utils::Config) -> Result<Self> {
        Self::builder()
            .model(config.model.clone())
            .call_timeout(config.request_timeout)
            .transport(config.document_transport.parse()?)
            .build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ReportError::Config("model must not be empty".to_string()));
        }

        for (name, value) in [
            ("extraction_temperature", self.extraction_temperature),
            ("analysis_temperature", self.analysis_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ReportError::Config(format!(
                    "{name} must be between 0.0 and 2.0, got {value}"
                )));
            }
        }

        if self.max_output_tokens == Some(0) {
            return Err(ReportError::Config(
                "max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.call_timeout.is_zero() {
            return Err(ReportError::Config(
                "call_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    model: Option<String>,
    extraction_temperature: Option<f32>,
    analysis_temperature: Option<f32>,
    max_output_tokens: Option<usize>,
    call_timeout: Option<Duration>,
    transport: Option<DocumentTransport>,
    grounding: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the extraction temperature
    pub fn extraction_temperature(mut self, temperature: f32) -> Self {
        self.extraction_temperature = Some(temperature);
        self
    }

    /// Set the analysis temperature
    pub fn analysis_temperature(mut self, temperature: f32) -> Self {
        self.analysis_temperature = Some(temperature);
        self
    }

    /// Cap output tokens
    pub fn max_output_tokens(mut self, tokens: usize) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Set the per-call budget
    pub fn call_timeout(mut self, duration: Duration) -> Self {
        self.call_timeout = Some(duration);
        self
    }

    /// Set the document transport
    pub fn transport(mut self, transport: DocumentTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Enable or disable the grounded analysis tier
    pub fn grounding(mut self, enabled: bool) -> Self {
        self.grounding = Some(enabled);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            model: self.model.unwrap_or(defaults.model),
            extraction_temperature: self
                .extraction_temperature
                .unwrap_or(defaults.extraction_temperature),
            analysis_temperature: self
                .analysis_temperature
                .unwrap_or(defaults.analysis_temperature),
            max_output_tokens: self.max_output_tokens.or(defaults.max_output_tokens),
            call_timeout: self.call_timeout.unwrap_or(defaults.call_timeout),
            transport: self.transport.unwrap_or(defaults.transport),
            grounding: self.grounding.unwrap_or(defaults.grounding),
        };

        config.validate()?;
        Ok(config)
    }
}
