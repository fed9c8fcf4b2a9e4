//! Groq chat-completions client (OpenAI-compatible wire format).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::LlmError;
use super::{ChatMessage, ChatOptions, ChatResponse, LlmClient, TokenUsage};

/// Default Groq endpoint.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq API client. Issues exactly one request per call.
pub struct GroqClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GroqClient {
    /// Create a client against a custom endpoint, optionally with a request timeout.
    pub fn with_endpoint(api_key: String, api_url: String, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        });
        Self {
            client,
            api_key,
            api_url,
        }
    }

    async fn execute_request(&self, request: &GroqRequest) -> Result<ChatResponse, LlmError> {
        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::network_error(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::network_error(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::network_error(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network_error(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        let parsed: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No choices in response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            usage: parsed
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        let request = GroqRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: options.temperature,
        };

        tracing::debug!("Sending request to Groq: model={}", model);

        self.execute_request(&request).await
    }
}

/// Groq API request format.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Groq API response format.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Debug, Deserialize)]
struct GroqMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Serve a single canned reply on an ephemeral port and record the request body.
    async fn mock_provider(
        status: StatusCode,
        reply: Value,
    ) -> (String, Arc<Mutex<Option<Value>>>) {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = Arc::clone(&seen_clone);
                let reply = reply.clone();
                async move {
                    *seen.lock().await = Some(body);
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1/chat/completions", addr), seen)
    }

    #[tokio::test]
    async fn test_extracts_first_choice_and_sends_options() {
        let (url, seen) = mock_provider(
            StatusCode::OK,
            json!({
                "model": "groq/compound-mini",
                "choices": [
                    {"message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
                    {"message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }),
        )
        .await;

        let client = GroqClient::with_endpoint("test-key".to_string(), url, None);
        let messages = vec![ChatMessage::system("be calm"), ChatMessage::user("clean room")];
        let options = ChatOptions {
            temperature: Some(0.3),
        };

        let response = client
            .chat_completion("groq/compound-mini", &messages, options)
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("first"));
        assert_eq!(response.usage, Some(TokenUsage::new(10, 5)));

        let body = seen.lock().await.clone().unwrap();
        assert_eq!(body["model"], "groq/compound-mini");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "clean room");
        assert_eq!(body.as_object().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_client_error() {
        let (url, _) = mock_provider(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Invalid API Key"}}),
        )
        .await;

        let client = GroqClient::with_endpoint("bad-key".to_string(), url, None);
        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], ChatOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ClientError);
        assert_eq!(err.status_code, Some(401));
        assert!(err.message.contains("Invalid API Key"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let (url, _) = mock_provider(StatusCode::OK, json!({"choices": []})).await;

        let client = GroqClient::with_endpoint("k".to_string(), url, None);
        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], ChatOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GroqClient::with_endpoint(
            "k".to_string(),
            format!("http://{}/v1/chat/completions", addr),
            Some(Duration::from_secs(5)),
        );
        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], ChatOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::NetworkError);
    }
}
