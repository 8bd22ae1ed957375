//! Completion request instrumentation (GenAI semantic conventions).

use crate::types::TokenUsage;
use tracing::{field, span, Level, Span};

/// Create a span around one completion request.
///
/// # Arguments
///
/// * `model` - Requested model name
/// * `temperature` - Sampling temperature
/// * `max_tokens` - Completion token limit
/// * `attempt` - 1-based attempt number
///
/// # Returns
///
/// Span with usage fields left empty until `record_llm_usage` is called
/// inside it.
pub fn llm_span(model: &str, temperature: f32, max_tokens: u32, attempt: u32) -> Span {
    span!(
        Level::INFO,
        "llm",
        otel.name = format!("text_completion {}", model),
        otel.kind = "client",
        gen_ai.system = "openai",
        gen_ai.operation.name = "text_completion",
        gen_ai.request.model = model,
        gen_ai.request.temperature = temperature as f64,
        gen_ai.request.max_tokens = max_tokens,
        attempt = attempt,
        gen_ai.usage.input_tokens = field::Empty,
        gen_ai.usage.output_tokens = field::Empty,
    )
}

/// Record token usage on the current span.
pub fn record_llm_usage(usage: &TokenUsage) {
    let span = Span::current();
    span.record("gen_ai.usage.input_tokens", usage.prompt_tokens);
    span.record("gen_ai.usage.output_tokens", usage.completion_tokens);
}
