use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmProvider, LlmSettings};

use super::{LlmClient, ProviderError, STRUCTURED_OUTPUT_SUFFIX};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct AIClient {
    http: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
    provider: LlmProvider,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AIClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ProviderError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            user_agent: settings.user_agent.clone(),
            provider: settings.provider,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut req_builder = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .json(&request);

        if matches!(self.provider, LlmProvider::OpenRouter) {
            req_builder = req_builder.header("X-Title", "triad");
        }

        let response = req_builder
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|err| {
                    ProviderError::Transport(format!("failed to parse chat completion JSON: {err}"))
                }),
            StatusCode::TOO_MANY_REQUESTS => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ProviderError::RateLimited(error_text))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized),
            StatusCode::BAD_REQUEST => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ProviderError::InvalidRequest(error_text))
            }
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ProviderError::Unavailable(error_text))
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                if error_text.contains("RESOURCE_EXHAUSTED") {
                    return Err(ProviderError::RateLimited(error_text));
                }
                Err(ProviderError::Api {
                    status: status.as_u16(),
                    body: error_text,
                })
            }
        }
    }
}

#[async_trait]
impl LlmClient for AIClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        structured: bool,
    ) -> Result<String, ProviderError> {
        let (system_content, response_format) = if structured {
            (
                format!("{system}{STRUCTURED_OUTPUT_SUFFIX}"),
                Some(ResponseFormat::json_object()),
            )
        } else {
            (system.to_string(), None)
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: ChatMessageRole::System,
                    content: system_content,
                },
                ChatMessage {
                    role: ChatMessageRole::User,
                    content: user.to_string(),
                },
            ],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            response_format,
        };

        debug!(provider = %self.provider, model = %self.model, "sending chat completion");
        let response = self.chat_completion(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let content = choice.message.content.trim();
        if content.is_empty() {
            debug!(finish_reason = ?choice.finish_reason, "provider returned empty content");
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatMessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings(base_url: String) -> LlmSettings {
        LlmSettings {
            provider: LlmProvider::OpenAi,
            api_key: "test-key".to_string(),
            model: "gpt-test".to_string(),
            base_url,
            timeout_secs: 5,
            max_tokens: 256,
            temperature: 0.0,
            user_agent: "triad/test".to_string(),
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "choices": [
                {
                    "index": 0,
                    "finish_reason": "stop",
                    "message": { "role": "assistant", "content": content }
                }
            ]
        })
    }

    #[tokio::test]
    async fn structured_request_asks_for_json_object() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("Authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "gpt-test",
                        "messages": [
                            {
                                "role": "system",
                                "content": format!("You are a judge.{STRUCTURED_OUTPUT_SUFFIX}")
                            },
                            { "role": "user", "content": "Pytest Output:\n2 passed" }
                        ],
                        "max_tokens": 256,
                        "temperature": 0.0,
                        "response_format": { "type": "json_object" }
                    }));
                then.status(200)
                    .json_body(completion("  {\"success\":true,\"reason\":\"ok\"}\n"));
            })
            .await;

        let client = AIClient::new(&settings(server.base_url())).unwrap();
        let text = client
            .complete("You are a judge.", "Pytest Output:\n2 passed", true)
            .await
            .unwrap();

        assert_eq!(text, "{\"success\":true,\"reason\":\"ok\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn plain_request_omits_response_format() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions").json_body(json!({
                    "model": "gpt-test",
                    "messages": [
                        { "role": "system", "content": "sys" },
                        { "role": "user", "content": "hi" }
                    ],
                    "max_tokens": 256,
                    "temperature": 0.0
                }));
                then.status(200).json_body(completion("hello"));
            })
            .await;

        let client = AIClient::new(&settings(server.base_url())).unwrap();
        let text = client.complete("sys", "hi", false).await.unwrap();

        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn too_many_requests_is_throttling() {
        let server = MockServer::start_async().await;

        let _mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("quota exceeded per minute");
            })
            .await;

        let client = AIClient::new(&settings(server.base_url())).unwrap();
        let err = client.complete("sys", "hi", true).await.unwrap_err();

        assert!(err.is_throttled());
        assert!(err.to_string().contains("quota exceeded per minute"));
    }

    #[tokio::test]
    async fn unauthorized_is_not_throttling() {
        let server = MockServer::start_async().await;

        let _mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body("bad key");
            })
            .await;

        let client = AIClient::new(&settings(server.base_url())).unwrap();
        let err = client.complete("sys", "hi", true).await.unwrap_err();

        assert_eq!(err, ProviderError::Unauthorized);
        assert!(!err.is_throttled());
    }

    #[tokio::test]
    async fn empty_choices_are_an_empty_response() {
        let server = MockServer::start_async().await;

        let _mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let client = AIClient::new(&settings(server.base_url())).unwrap();
        let err = client.complete("sys", "hi", true).await.unwrap_err();

        assert_eq!(err, ProviderError::EmptyResponse);
    }
}
