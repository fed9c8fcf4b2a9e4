//! Single-shot LLM call that turns a prompt into a `DecompositionResult`.
//!
//! Provider failures (network, auth, 5xx) propagate as `LlmError`. A reply that
//! arrives but cannot be used is never an error: it is downgraded to the
//! `Failure` variant carrying the raw text.

use std::sync::Arc;

use super::types::{DecompositionResult, StepPlan};
use crate::llm::{ChatMessage, ChatOptions, LlmClient, LlmError};

/// System turn sent with every decomposition request.
pub const SYSTEM_PROMPT: &str = "You are a calm productivity assistant for people with low focus. \
Break tasks into very small, gentle steps. \
Return STRICT JSON only.";

pub const DEFAULT_MODEL: &str = "groq/compound-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Error text stored when the reply is not JSON at all.
pub const INVALID_JSON_ERROR: &str = "LLM returned invalid JSON";
/// Error text stored when the reply is JSON but not a step plan.
pub const SCHEMA_MISMATCH_ERROR: &str = "LLM returned JSON that does not match the step schema";

pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f64,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion for `prompt` and interpret the first choice.
    pub async fn complete(&self, prompt: &str) -> Result<DecompositionResult, LlmError> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let options = ChatOptions {
            temperature: Some(self.temperature),
        };

        let response = self
            .client
            .chat_completion(&self.model, &messages, options)
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "Completion used {} prompt + {} completion tokens",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        let content = response.content.unwrap_or_default();
        Ok(interpret_completion(&content))
    }
}

/// Parse then validate model output against the step-plan shape.
pub fn interpret_completion(text: &str) -> DecompositionResult {
    let candidate = strip_code_fence(text);

    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                "LLM output is not JSON ({}); preview: {}",
                e,
                preview(text)
            );
            return DecompositionResult::failure(INVALID_JSON_ERROR, text);
        }
    };

    match serde_json::from_value::<StepPlan>(value) {
        Ok(plan) => DecompositionResult::Success(plan),
        Err(e) => {
            tracing::warn!(
                "LLM output does not match step schema ({}); preview: {}",
                e,
                preview(text)
            );
            DecompositionResult::failure(SCHEMA_MISMATCH_ERROR, text)
        }
    }
}

/// Remove one surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // Drop the info string on the opening line (e.g. "json").
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}
