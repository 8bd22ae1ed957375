//! LLM-powered natural language to SQL generation.

pub mod client;
pub mod generator;
pub mod prompt;

pub use client::{Completion, CompletionModel, OpenAiCompletionClient};
pub use generator::{parse_response, SqlGenerator};
pub use prompt::PromptTemplate;
