//! Prompt template management for finlens
//!
//! Prompts are Jinja2 templates rendered with MiniJinja. On top of the stock
//! syntax, two filters are registered for financial prompts:
//!
//! - `thousands(decimals=0)`: group digits with commas (`1,250,000`)
//! - `pretty_json`: embed a value as indented JSON
//!
//! # Quick Start
//!
//! ```
//! use finlens_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(
//!     JinjaTemplate::new("summary", "{{ company }}: ${{ revenue | thousands }}").unwrap(),
//! );
//!
//! let prompt = registry
//!     .render("summary", &json!({ "company": "Acme", "revenue": 5000000 }))
//!     .unwrap();
//! assert_eq!(prompt, "Acme: $5,000,000");
//! ```

mod error;
mod filters;
mod jinja;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use filters::format_thousands;
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::{PromptTemplate, render_with};
