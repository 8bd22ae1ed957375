//! Prompt templates with schema context.

use crate::types::Result;
use std::fs;
use std::path::Path;

/// Placeholder replaced by the database schema text.
pub const SCHEMA_PLACEHOLDER: &str = "{{schema}}";

/// Placeholder replaced by the user's question.
pub const QUESTION_PLACEHOLDER: &str = "{{user_question}}";

/// Prompt template, usually with the schema already filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template and insert the schema file's contents.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::IoError` if either file cannot be read.
    pub fn load(prompt_path: &Path, schema_path: &Path) -> Result<Self> {
        let schema = fs::read_to_string(schema_path)?;
        let template = fs::read_to_string(prompt_path)?;

        let prompt = Self::new(template).with_schema(&schema);
        if !prompt.template.contains(QUESTION_PLACEHOLDER) {
            tracing::warn!(
                prompt = %prompt_path.display(),
                "prompt template has no {} placeholder; every question gets the same prompt",
                QUESTION_PLACEHOLDER
            );
        }
        Ok(prompt)
    }

    /// Replace every schema placeholder.
    pub fn with_schema(self, schema: &str) -> Self {
        Self {
            template: self.template.replace(SCHEMA_PLACEHOLDER, schema),
        }
    }

    /// Fill in the question.
    pub fn render(&self, question: &str) -> String {
        self.template.replace(QUESTION_PLACEHOLDER, question)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Short stable identifier of the template text.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.template.as_bytes());
        hash.to_hex().as_str()[..16].to_string()
    }
}
