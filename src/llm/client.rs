//! Text-completion client for OpenAI-compatible endpoints.

use crate::config::LlmSettings;
use crate::otel::{llm_span, record_llm_usage};
use crate::types::{EvalError, Result, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// Completion text plus token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Anything that turns a prompt into a completion.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Complete a fully rendered prompt.
    async fn complete(&self, prompt: &str) -> Result<Completion>;

    /// Model identifier, recorded in run metadata.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: CompletionModel + ?Sized> CompletionModel for &T {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        (**self).complete(prompt).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Request body for `POST /completions`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
}

/// Response body for `POST /completions`.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Client for the legacy `/completions` API of an OpenAI-compatible server.
pub struct OpenAiCompletionClient {
    settings: LlmSettings,
    client: Client,
}

impl OpenAiCompletionClient {
    /// Create new completion client.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::HttpError` if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Single request, no retries.
    async fn request_once(&self, prompt: &str) -> Result<Completion> {
        let body = CompletionRequest {
            model: &self.settings.model,
            prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let mut request = self
            .client
            .post(self.settings.completions_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(EvalError::LlmStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

/// Parse a `/completions` response body.
fn parse_completion(body: &str) -> Result<Completion> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| EvalError::llm(format!("Failed to parse completion response: {}", e)))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| EvalError::llm("No choices in completion response"))?
        .text;

    Ok(Completion {
        text,
        usage: parsed.usage.unwrap_or_default(),
    })
}

#[async_trait]
impl CompletionModel for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let attempts = self.settings.retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let span = llm_span(
                &self.settings.model,
                self.settings.temperature,
                self.settings.max_tokens,
                attempt,
            );

            let outcome = async {
                let result = self.request_once(prompt).await;
                if let Ok(completion) = &result {
                    record_llm_usage(&completion.usage);
                }
                result
            }
            .instrument(span)
            .await;

            match outcome {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(attempt, attempts, error = %e, "completion request failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.settings.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(EvalError::LlmUnavailable {
            attempts,
            last_error,
        })
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = CompletionRequest {
            model: "m",
            prompt: "p",
            temperature: 0.5,
            max_tokens: 300,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"model": "m", "prompt": "p", "temperature": 0.5, "max_tokens": 300}));
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{
            "id": "cmpl-1",
            "choices": [{"text": "<sql>SELECT 1</sql>", "index": 0, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }"#;

        let completion = parse_completion(body).unwrap();
        assert_eq!(completion.text, "<sql>SELECT 1</sql>");
        assert_eq!(completion.usage.total_tokens, 19);
    }

    #[test]
    fn test_parse_completion_without_usage() {
        let completion = parse_completion(r#"{"choices": [{"text": "x"}]}"#).unwrap();
        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[test]
    fn test_parse_completion_errors() {
        assert!(matches!(parse_completion(r#"{"choices": []}"#), Err(EvalError::LlmError(_))));
        assert!(matches!(parse_completion("not json"), Err(EvalError::LlmError(_))));
    }
}
