//! Core data types for generation and evaluation.
//!
//! Defines the records exchanged between pipeline stages:
//! - `Example`: natural-language question with its ground-truth SQL
//! - `GeneratedQuery`: model output for one question
//! - `QueryEvaluation`: scores for one generated/reference pair
//! - `EvalError`: error type for all operations
//! - `Result`: convenient result type alias

pub mod error;
pub mod evaluation;
pub mod example;
pub mod result;

pub use error::EvalError;
pub use evaluation::{EvaluationMetrics, EvaluationReport, QueryEvaluation};
pub use example::{Example, GeneratedQuery, TokenUsage};
pub use result::Result;
