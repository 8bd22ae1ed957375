//! Evaluation results and aggregate metrics.

use serde::{Deserialize, Serialize};

/// Scores for one generated query against its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub question: String,
    pub generated_query: String,
    pub reference_query: String,

    /// Normalized tree edit distance (0 = identical)
    pub ast_distance: f64,

    /// Token-count cosine similarity (1 = same token bag)
    pub token_cosine: f64,

    /// Why the generated SQL could not be scored normally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryEvaluation {
    /// Worst possible scores, used when there is no usable generated SQL.
    pub fn worst(question: &str, generated_query: &str, reference_query: &str) -> Self {
        Self {
            question: question.to_string(),
            generated_query: generated_query.to_string(),
            reference_query: reference_query.to_string(),
            ast_distance: 1.0,
            token_cosine: 0.0,
            error: None,
        }
    }
}

/// Tracked metrics written to `metrics.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub ast_distance_mean: f64,
    pub token_cosine_mean: f64,

    /// Number of evaluated pairs
    #[serde(default)]
    pub count: usize,
}

impl EvaluationMetrics {
    /// Arithmetic means over all results; `None` when there are none.
    pub fn from_results(results: &[QueryEvaluation]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let n = results.len() as f64;
        let ast_sum: f64 = results.iter().map(|r| r.ast_distance).sum();
        let cosine_sum: f64 = results.iter().map(|r| r.token_cosine).sum();

        Some(Self {
            ast_distance_mean: ast_sum / n,
            token_cosine_mean: cosine_sum / n,
            count: results.len(),
        })
    }
}

/// Per-query results plus aggregate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub results: Vec<QueryEvaluation>,
    pub metrics: EvaluationMetrics,
}
