//! System prompt
//!
//! The template is compiled into the binary from a `.pmt` file and rendered
//! with Handlebars.

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;

/// Embedded system prompt template
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Values substituted into the system prompt
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub working_dir: String,
    pub max_chars: usize,
    pub interpreter: String,
    pub extensions: String,
}

impl PromptContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            working_dir: config.sandbox.working_dir.display().to_string(),
            max_chars: config.limits.max_file_read_chars,
            interpreter: config.sandbox.interpreter.clone(),
            extensions: config
                .sandbox
                .extensions
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Render the system prompt
pub fn render_system_prompt(context: &PromptContext) -> Result<String> {
    debug!(?context, "render_system_prompt: called");
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);
    // Plain text, not HTML
    hbs.register_escape_fn(handlebars::no_escape);

    hbs.render_template(SYSTEM, context)
        .context("Failed to render system prompt")
}
