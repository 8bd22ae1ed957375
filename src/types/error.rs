//! Error types for generation and evaluation runs.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use thiserror::Error;

/// Error type for every fallible operation in the crate.
#[derive(Error, Debug)]
pub enum EvalError {
    /// SQL text could not be parsed
    #[error("SQL parsing failed: {0}")]
    SqlParse(String),

    /// SQL text could not be tokenized
    #[error("SQL tokenizing failed: {0}")]
    Tokenize(String),

    /// Generated and reference entries are not about the same question
    #[error("Questions don't match: generated {generated:?}, reference {reference:?}")]
    QuestionMismatch { generated: String, reference: String },

    /// Nothing to evaluate
    #[error("No query pairs to evaluate")]
    EmptyEvaluation,

    /// Completion endpoint returned a malformed or empty answer
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Completion endpoint answered with a non-success status
    #[error("LLM API error {status}: {body}")]
    LlmStatus { status: u16, body: String },

    /// All attempts against the completion endpoint failed
    #[error("LLM not working after {attempts} attempt(s): {last_error}")]
    LlmUnavailable { attempts: u32, last_error: String },

    /// Schema text could not be interpreted
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Tracing/exporter setup failed
    #[error("Tracing initialization failed: {0}")]
    TracingError(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parameter file error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EvalError {
    /// Create an LLM error with context.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::LlmError(msg.into())
    }

    /// Create a configuration error with context.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is recoverable.
    ///
    /// # Returns
    ///
    /// `true` for transport failures, rate limiting and server-side errors,
    /// i.e. when repeating the same request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().map_or(false, |s| s.is_server_error() || s.as_u16() == 429)
            }
            Self::LlmStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<sqlparser::parser::ParserError> for EvalError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        EvalError::SqlParse(err.to_string())
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for EvalError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        EvalError::Tokenize(err.to_string())
    }
}
