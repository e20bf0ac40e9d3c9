//! Model-serving abstraction layer for finlens
//!
//! This crate provides provider-agnostic abstractions for asking a hosted model
//! about whole documents. It includes:
//!
//! - Message types carrying text and PDF documents
//! - Completion request/response types
//! - Provider-side tools (search grounding)
//! - Provider and file store traits
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, ResponseFormat, StopReason,
    TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, DocumentSource, Message, MessageContent, PDF_MIME_TYPE, Role};
pub use provider::{FileStore, LLMProvider, UploadedFile};
pub use tools::BuiltinTool;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;
