//! Scores generated queries against reference queries.

use crate::eval::distance::tree_distance;
use crate::eval::normalize::normalize_statement;
use crate::eval::tokens::cosine_similarity;
use crate::eval::tree::SqlTree;
use crate::types::{
    EvalError, EvaluationMetrics, EvaluationReport, Example, GeneratedQuery, QueryEvaluation, Result,
};
use rayon::prelude::*;

/// Score one generated query against its reference example.
///
/// # Errors
///
/// - `QuestionMismatch` if the two entries are about different questions
/// - `SqlParse` if the reference query cannot be parsed
///
/// Generated SQL that is empty or unparseable gets the worst scores
/// instead of failing the run. Empty SQL is scored before the reference
/// is parsed.
pub fn evaluate_query(generated: &GeneratedQuery, reference: &Example) -> Result<QueryEvaluation> {
    if generated.question != reference.question {
        return Err(EvalError::QuestionMismatch {
            generated: generated.question.clone(),
            reference: reference.question.clone(),
        });
    }

    let worst = QueryEvaluation::worst(
        &generated.question,
        &generated.generated_query,
        &reference.query,
    );
    if generated.generated_query.trim().is_empty() {
        return Ok(worst);
    }

    let reference_statement = normalize_statement(&reference.query)?;

    let generated_statement = match normalize_statement(&generated.generated_query) {
        Ok(statement) => statement,
        Err(e) => {
            tracing::warn!(question = %generated.question, error = %e, "generated SQL did not parse");
            return Ok(QueryEvaluation {
                error: Some(e.to_string()),
                ..worst
            });
        }
    };

    let ast_distance = tree_distance(
        &SqlTree::from_statement(&generated_statement)?,
        &SqlTree::from_statement(&reference_statement)?,
    );
    let token_cosine = cosine_similarity(
        &generated_statement.to_string(),
        &reference_statement.to_string(),
    )?;

    Ok(QueryEvaluation {
        ast_distance,
        token_cosine,
        ..worst
    })
}

/// Score generated queries against references, pairing them by position.
///
/// Pairs beyond the shorter list are ignored. Pairs are scored in
/// parallel; results keep input order, and on failure the error of the
/// earliest failing pair is returned.
pub fn evaluate_all(generated: &[GeneratedQuery], references: &[Example]) -> Result<EvaluationReport> {
    if generated.len() != references.len() {
        tracing::warn!(
            generated = generated.len(),
            references = references.len(),
            "list lengths differ, evaluating the common prefix"
        );
    }

    // first failure in input order wins
    let results = generated
        .par_iter()
        .zip(references.par_iter())
        .map(|(g, r)| evaluate_query(g, r))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let metrics = EvaluationMetrics::from_results(&results).ok_or(EvalError::EmptyEvaluation)?;
    tracing::info!(
        count = metrics.count,
        ast_distance_mean = metrics.ast_distance_mean,
        token_cosine_mean = metrics.token_cosine_mean,
        "evaluation complete"
    );

    Ok(EvaluationReport { results, metrics })
}
