//! Pipeline job instrumentation.
//!
//! Generation, evaluation and report jobs are not client calls, so they use
//! INTERNAL span kind.

use tracing::{field, span, Level, Span};

/// Pipeline job types (maps to `job.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    /// Prompt the model for every example
    Generate,
    /// Score generated queries against references
    Evaluate,
    /// Merge exact and descriptive schemas
    SchemaMerge,
    /// Compare metrics across runs
    Compare,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Evaluate => "evaluate",
            Self::SchemaMerge => "schema_merge",
            Self::Compare => "compare",
        }
    }
}

/// Create a job span.
///
/// # Arguments
///
/// * `job` - Job type
/// * `batch_size` - Number of items the job will process
///
/// # Example
///
/// ```rust,ignore
/// let span = job_span(JobType::Generate, examples.len());
/// let _guard = span.enter();
/// // ...
/// record_job_status("ok");
/// ```
pub fn job_span(job: JobType, batch_size: usize) -> Span {
    span!(
        Level::INFO,
        "job",
        otel.name = job.as_str(),
        otel.kind = "internal",
        "job.type" = job.as_str(),
        job.batch_size = batch_size,
        job.status = field::Empty,
    )
}

/// Record the outcome on the current job span.
pub fn record_job_status(status: &str) {
    Span::current().record("job.status", status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_names() {
        assert_eq!(JobType::Generate.as_str(), "generate");
        assert_eq!(JobType::SchemaMerge.as_str(), "schema_merge");
    }

    #[test]
    fn test_job_span_creation() {
        let span = job_span(JobType::Evaluate, 10);
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "job");
        }
    }
}
