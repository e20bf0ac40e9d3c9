//! MiniJinja-based template implementation
//!
//! This module provides a [`JinjaTemplate`] implementation that uses the MiniJinja
//! template engine for variable interpolation and conditional rendering.

use crate::{PromptError, PromptTemplate, Result, filters};
use minijinja::{Environment, UndefinedBehavior};

/// A prompt template backed by MiniJinja
///
/// # Template Syntax
///
/// The template uses standard Jinja2 syntax plus the finlens filters:
/// - Variables: `{{ variable }}`
/// - Number formatting: `{{ revenue | thousands }}`, `{{ ratio | thousands(2) }}`
/// - Embedded JSON: `{{ ratios | pretty_json }}`
/// - Conditionals: `{% if condition %}...{% endif %}`
///
/// Rendering is strict: referencing a variable missing from the context is an
/// error rather than an empty string.
///
/// # Examples
///
/// ```
/// use finlens_prompt::{JinjaTemplate, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("revenue", "Revenue: ${{ revenue | thousands }}").unwrap();
/// let result = template.render(&json!({ "revenue": 1250000.0 })).unwrap();
/// assert_eq!(result, "Revenue: $1,250,000");
/// ```
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, validating that it parses
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        {
            let mut env = Environment::new();
            filters::register(&mut env);
            env.template_from_str(&source)
                .map(|_| ())
                .map_err(|e| PromptError::TemplateParseFailed {
                    name: name.clone(),
                    detail: e.to_string(),
                })?;
        }

        Ok(Self { name, source })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        filters::register(&mut env);
        env
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = Self::environment();
        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("len", &self.source.len())
            .finish()
    }
}
