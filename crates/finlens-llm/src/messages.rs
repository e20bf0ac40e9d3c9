//! Message types for LLM communication
//!
//! This module defines the message types used for model interactions. Content is
//! multi-modal: a message can carry plain text alongside whole documents, either
//! inlined as base64 or referenced by a previously uploaded file URI.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// MIME type used for PDF documents
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant (model) message
    Assistant,
}

/// Where a document's bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    /// Base64-encoded document carried in the request body
    Base64 {
        /// Media type (e.g., "application/pdf")
        media_type: String,
        /// Base64-encoded bytes
        data: String,
    },
    /// Document previously uploaded to the provider's file store
    File {
        /// Media type (e.g., "application/pdf")
        media_type: String,
        /// Provider URI of the uploaded file
        uri: String,
    },
}

/// Content block in a message (supports multi-modal content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Whole-document content
    Document {
        /// Document source
        source: DocumentSource,
    },
}

impl ContentBlock {
    /// Text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Inline PDF block built from raw bytes
    pub fn pdf_bytes(bytes: &[u8]) -> Self {
        Self::Document {
            source: DocumentSource::Base64 {
                media_type: PDF_MIME_TYPE.to_string(),
                data: BASE64.encode(bytes),
            },
        }
    }

    /// PDF block referencing an uploaded file
    pub fn pdf_file(uri: impl Into<String>) -> Self {
        Self::Document {
            source: DocumentSource::File {
                media_type: PDF_MIME_TYPE.to_string(),
                uri: uri.into(),
            },
        }
    }
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create a user message from content blocks
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(blocks)),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Extract text content from the message (convenience method)
    ///
    /// For block content, all text blocks are concatenated in order; models
    /// sometimes split one JSON answer across several parts.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        ContentBlock::Document { .. } => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.concat())
                }
            }
            None => None,
        }
    }

    /// Check if this message carries any document blocks
    pub fn has_documents(&self) -> bool {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .any(|b| matches!(b, ContentBlock::Document { .. })),
            _ => false,
        }
    }
}
