//! Question/SQL records read from and written to JSON files.

use serde::{Deserialize, Serialize};

/// Reference example: a natural-language question and its ground-truth SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Natural-language question
    pub question: String,

    /// Expected SQL
    pub query: String,
}

impl Example {
    pub fn new(question: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            query: query.into(),
        }
    }
}

/// Token accounting reported by the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

/// One model answer for one question.
///
/// Usage counters are flattened so the JSON record carries
/// `prompt_tokens`, `completion_tokens` and `total_tokens` at top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    #[serde(flatten)]
    pub usage: TokenUsage,

    /// Question the model was asked
    pub question: String,

    /// Raw completion text
    #[serde(default)]
    pub response: String,

    /// SQL extracted from the `<sql>` section (empty if none)
    #[serde(default)]
    pub generated_query: String,

    /// Text extracted from the `<reasoning>` section (empty if none)
    #[serde(default)]
    pub reasoning: String,
}
