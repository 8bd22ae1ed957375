//! Natural language to SQL generation.

use crate::llm::client::CompletionModel;
use crate::llm::prompt::PromptTemplate;
use crate::types::{EvalError, Example, GeneratedQuery, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::Lazy;
use regex::Regex;

static SQL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<sql>(.*?)</sql>").unwrap());

static REASONING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<reasoning>(.*?)</reasoning>").unwrap());

/// Extract SQL and reasoning sections from a model response.
///
/// # Returns
///
/// `(sql, reasoning)`, each trimmed; empty when the section is missing.
///
/// # Examples
///
/// ```
/// use sqleval::llm::parse_response;
///
/// let (sql, reasoning) = parse_response("<reasoning>count rows</reasoning>\n<sql>\nSELECT COUNT(*) FROM t\n</sql>");
/// assert_eq!(sql, "SELECT COUNT(*) FROM t");
/// assert_eq!(reasoning, "count rows");
/// ```
pub fn parse_response(response: &str) -> (String, String) {
    let section = |pattern: &Regex| {
        pattern
            .captures(response)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    (section(&SQL_PATTERN), section(&REASONING_PATTERN))
}

/// Generates SQL for questions using a prompt template and a completion model.
pub struct SqlGenerator<M> {
    model: M,
    template: PromptTemplate,
}

impl<M: CompletionModel> SqlGenerator<M> {
    pub fn new(model: M, template: PromptTemplate) -> Self {
        Self { model, template }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Generate SQL for one question.
    ///
    /// # Errors
    ///
    /// Propagates completion errors; a response without an `<sql>` section
    /// is not an error (the generated query is empty).
    pub async fn generate(&self, question: &str) -> Result<GeneratedQuery> {
        let prompt = self.template.render(question);
        let completion = self.model.complete(&prompt).await?;
        let (sql, reasoning) = parse_response(&completion.text);

        if sql.is_empty() {
            tracing::warn!(question, "response contained no <sql> section");
        } else {
            tracing::debug!(question, sql = %sql, "generated query");
        }

        Ok(GeneratedQuery {
            usage: completion.usage,
            question: question.to_string(),
            response: completion.text,
            generated_query: sql,
            reasoning,
        })
    }

    /// Generate SQL for every example, in input order.
    ///
    /// At most `concurrency` requests are in flight (minimum 1). The first
    /// failure aborts the run.
    pub async fn generate_all(
        &self,
        examples: &[Example],
        concurrency: usize,
    ) -> Result<Vec<GeneratedQuery>> {
        let total = examples.len();

        stream::iter(examples.iter().enumerate())
            .map(|(i, example)| async move {
                let generated = self.generate(&example.question).await?;
                tracing::info!(done = i + 1, total, "question generated");
                Ok::<_, EvalError>(generated)
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }
}
