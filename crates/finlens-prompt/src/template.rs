//! Core prompt template trait
//!
//! This module defines the [`PromptTemplate`] trait that all template implementations must follow.

use crate::Result;
use serde::Serialize;

/// Core trait for prompt templates
///
/// This trait is dyn-compatible, using `serde_json::Value` for variables instead of generics.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Get raw template source (for debugging/inspection)
    fn raw_template(&self) -> &str;
}

/// Render any template with a serializable context
///
/// Convenience for callers holding typed context structs rather than JSON values.
pub fn render_with<T: Serialize + ?Sized>(
    template: &dyn PromptTemplate,
    context: &T,
) -> Result<String> {
    let vars = serde_json::to_value(context)?;
    template.render(&vars)
}
