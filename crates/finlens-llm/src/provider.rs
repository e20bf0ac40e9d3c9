//! LLM provider and file store trait definitions

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for LLM providers
///
/// Implementations of this trait provide access to a hosted model service.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages, tools, and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;
}

/// A document held in the provider's file store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Resource name used for deletion (e.g. "files/abc-123")
    pub name: String,
    /// URI to reference the file from a completion request
    pub uri: String,
    /// Media type recorded by the provider
    pub mime_type: String,
}

/// Providers that accept documents uploaded ahead of a completion
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload a local file and return its handle
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile>;

    /// Delete a previously uploaded file
    async fn delete(&self, file: &UploadedFile) -> Result<()>;
}
