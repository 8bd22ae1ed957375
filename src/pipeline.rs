//! Generation and evaluation stages as file-to-file jobs.
//!
//! ```text
//! examples.json ──GenerationJob──> generated_queries.json + run.json
//! generated_queries.json + examples.json ──EvaluationJob──> eval.json + metrics.json
//! ```

use crate::config::Params;
use crate::eval::evaluate_all;
use crate::experiments::{RunMetadata, METRICS_FILE};
use crate::files::{read_json, write_json};
use crate::llm::{CompletionModel, PromptTemplate, SqlGenerator};
use crate::otel::{job_span, record_job_status, JobType};
use crate::types::{EvaluationReport, Example, GeneratedQuery, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::Instrument;

pub const GENERATED_FILE: &str = "generated_queries.json";
pub const EVAL_FILE: &str = "eval.json";

/// Prompt the model for each example question.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub params: Params,
    pub examples_path: PathBuf,
    pub output_dir: PathBuf,

    /// Only the first `limit` examples are sent when set
    pub limit: Option<usize>,

    /// Maximum requests in flight
    pub concurrency: usize,
}

impl GenerationJob {
    /// Generate SQL for the examples and write the results.
    ///
    /// # Returns
    ///
    /// The generated records, in example order.
    pub async fn run<M: CompletionModel>(&self, model: M) -> Result<Vec<GeneratedQuery>> {
        let prompt = &self.params.generate.prompt;
        let template = PromptTemplate::load(&prompt.prompt_path, &prompt.schema_path)?;

        let mut examples: Vec<Example> = read_json(&self.examples_path)?;
        if let Some(limit) = self.limit {
            examples.truncate(limit);
        }

        let span = job_span(JobType::Generate, examples.len());
        async move {
            let metadata = RunMetadata {
                prompt_path: prompt.prompt_path.clone(),
                schema_path: prompt.schema_path.clone(),
                model: model.model_name().to_string(),
                temperature: self.params.generate.llm.temperature,
                max_tokens: self.params.generate.llm.max_tokens,
                prompt_fingerprint: template.fingerprint(),
                examples: examples.len(),
                generated_at: Utc::now(),
            };

            let generator = SqlGenerator::new(model, template);
            let generated = match generator.generate_all(&examples, self.concurrency).await {
                Ok(generated) => generated,
                Err(e) => {
                    record_job_status("error");
                    return Err(e);
                }
            };

            write_json(&self.output_dir.join(GENERATED_FILE), &generated)?;
            metadata.save(&self.output_dir)?;

            record_job_status("ok");
            tracing::info!(
                count = generated.len(),
                output = %self.output_dir.display(),
                "generation complete"
            );
            Ok(generated)
        }
        .instrument(span)
        .await
    }
}

/// Score generated queries against the reference examples.
#[derive(Debug, Clone)]
pub struct EvaluationJob {
    pub generated_path: PathBuf,
    pub examples_path: PathBuf,
    pub output_dir: PathBuf,
}

impl EvaluationJob {
    /// Evaluate and write `eval.json` and `metrics.json`.
    pub fn run(&self) -> Result<EvaluationReport> {
        let generated: Vec<GeneratedQuery> = read_json(&self.generated_path)?;
        let examples: Vec<Example> = read_json(&self.examples_path)?;

        let span = job_span(JobType::Evaluate, generated.len().min(examples.len()));
        let _guard = span.enter();

        let report = match evaluate_all(&generated, &examples) {
            Ok(report) => report,
            Err(e) => {
                record_job_status("error");
                return Err(e);
            }
        };

        write_json(&self.output_dir.join(EVAL_FILE), &report.results)?;
        write_json(&self.output_dir.join(METRICS_FILE), &report.metrics)?;

        record_job_status("ok");
        Ok(report)
    }
}
