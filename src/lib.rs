//! Natural-language-to-SQL prompt experiments.
//!
//! Generates SQL from questions with an OpenAI-compatible completion
//! endpoint and scores it against reference queries:
//!
//! - **AST distance**: normalized tree edit distance between parsed queries
//!   (0 = identical structure)
//! - **Token cosine**: cosine similarity of token counts (1 = same tokens)
//!
//! Also merges schema documentation for prompt context and compares metrics
//! across prompt variants.
//!
//! # Example
//!
//! ```
//! use sqleval::eval::{ast_distance, cosine_similarity};
//!
//! let generated = "select name from player where id = 1";
//! let reference = "SELECT name FROM player WHERE id = 1";
//!
//! assert_eq!(ast_distance(generated, reference).unwrap(), 0.0);
//! assert!(cosine_similarity(generated, reference).unwrap() > 0.99);
//! ```

pub mod config;
pub mod eval;
pub mod experiments;
pub mod files;
pub mod llm;
pub mod otel;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod types;

pub use config::{LlmSettings, Params};
pub use llm::{CompletionModel, OpenAiCompletionClient, PromptTemplate, SqlGenerator};
pub use pipeline::{EvaluationJob, GenerationJob};
pub use types::{
    EvalError, EvaluationMetrics, EvaluationReport, Example, GeneratedQuery, QueryEvaluation, Result,
    TokenUsage,
};
