//! Scripted LLM stub for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ChatMessage, ChatOptions, ChatResponse, LlmClient, LlmError};

/// LLM stub that replays queued replies and records what it was sent.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<Option<String>, LlmError>>>,
    pub calls: Mutex<Vec<(String, Vec<ChatMessage>, Option<f64>)>>,
}

impl ScriptedClient {
    pub fn replying(content: &str) -> Self {
        let client = Self::default();
        client.push(Ok(Some(content.to_string())));
        client
    }

    pub fn failing(error: LlmError) -> Self {
        let client = Self::default();
        client.push(Err(error));
        client
    }

    pub fn push(&self, reply: Result<Option<String>, LlmError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        self.calls.lock().unwrap().push((
            model.to_string(),
            messages.to_vec(),
            options.temperature,
        ));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network_error("no scripted reply".to_string())))?;
        Ok(ChatResponse {
            content: reply,
            ..Default::default()
        })
    }
}

