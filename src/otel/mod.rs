//! Logging and OpenTelemetry instrumentation.
//!
//! Console logging is always on (`RUST_LOG`, default `info`). Spans are
//! additionally exported over OTLP/gRPC when `SQLEVAL_ENABLE_TRACING` is
//! truthy and `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//!
//! # Span conventions
//!
//! **LLM calls** follow the GenAI semantic conventions:
//! - `gen_ai.system`, `gen_ai.operation.name`, `gen_ai.request.model`
//! - `gen_ai.usage.input_tokens`, `gen_ai.usage.output_tokens` once known
//!
//! **Pipeline jobs** (generate, evaluate, schema merge, compare) use
//! `INTERNAL` span kind with `job.type`, `job.batch_size`, `job.status`.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqleval::otel::{job_span, JobType};
//!
//! let span = job_span(JobType::Evaluate, 42);
//! let _guard = span.entered();
//! ```

pub mod job;
pub mod llm;

pub use job::{job_span, record_job_status, JobType};
pub use llm::{llm_span, record_llm_usage};

use crate::types::{EvalError, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Console log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Flushes exported spans when dropped.
pub struct OtelGuard {
    provider: Option<TracerProvider>,
}

impl OtelGuard {
    /// Whether spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

fn export_enabled() -> bool {
    env::var("SQLEVAL_ENABLE_TRACING")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Install the global subscriber.
///
/// Must be called from within a tokio runtime when export is enabled
/// (the batch exporter runs on it).
///
/// # Errors
///
/// Returns `EvalError::TracingError` if the exporter cannot be built or a
/// global subscriber is already installed.
pub fn init_tracing(service_name: &str, format: LogFormat) -> Result<OtelGuard> {
    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok().filter(|e| !e.is_empty());

    let provider = match endpoint.as_deref() {
        Some(endpoint) if export_enabled() => Some(build_provider(service_name, endpoint)?),
        _ => None,
    };

    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(service_name.to_string()))
    });

    let fmt_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().with_target(false).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| EvalError::TracingError(e.to_string()))?;

    match endpoint {
        Some(endpoint) if provider.is_some() => {
            tracing::info!(service = service_name, endpoint = %endpoint, "opentelemetry export enabled")
        }
        _ => tracing::debug!(service = service_name, "console logging initialized"),
    }

    Ok(OtelGuard { provider })
}

fn build_provider(service_name: &str, endpoint: &str) -> Result<TracerProvider> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| EvalError::TracingError(format!("exporter build failed: {}", e)))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build())
}
