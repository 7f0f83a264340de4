//! Completion service client for the Anthropic Messages API

use crate::config::ModelConfig;
use crate::error::{ContractAnalyzerError, Result, ServiceError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

/// One fully assembled model call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    /// System prompt followed by the language directive.
    pub instruction: String,
    /// Bounded document text, sent as the only user turn.
    pub payload: String,
    pub model: String,
    pub max_output_tokens: u32,
}

/// Anything that can turn an [`AnalysisRequest`] into generated text.
pub trait CompletionProvider {
    fn complete(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = std::result::Result<String, ServiceError>> + Send;
}

pub struct AnthropicClient {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<MessageParam<'a>>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model_config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(model_config.timeout_secs))
            .build()
            .map_err(|e| {
                ContractAnalyzerError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key: api_key.into(),
            api_base: model_config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.api_base)
    }
}

impl CompletionProvider for AnthropicClient {
    async fn complete(&self, request: &AnalysisRequest) -> std::result::Result<String, ServiceError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_output_tokens,
            system: &request.instruction,
            messages: vec![MessageParam {
                role: "user",
                content: &request.payload,
            }],
        };

        debug!("POST {} (model {})", self.messages_url(), request.model);
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }

        parse_completion(&body)
    }
}

/// Map a non-success HTTP status and body to a service error.
pub fn classify_failure(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        401 | 403 => ServiceError::Authentication(message),
        429 => ServiceError::RateLimited(message),
        _ => ServiceError::Api { status, message },
    }
}

/// Extract the first text block of a Messages API response body.
pub fn parse_completion(body: &str) -> std::result::Result<String, ServiceError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

    parsed
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or_else(|| ServiceError::MalformedResponse("response contained no text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion() {
        let body = r#"{"id":"msg_1","type":"message","role":"assistant",
            "content":[{"type":"text","text":"1. Contract Type: Lease"}],
            "stop_reason":"end_turn"}"#;
        assert_eq!(parse_completion(body).unwrap(), "1. Contract Type: Lease");
    }

    #[test]
    fn test_parse_completion_skips_non_text_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Done"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Done");
    }

    #[test]
    fn test_parse_completion_without_text() {
        assert!(matches!(
            parse_completion(r#"{"content":[]}"#),
            Err(ServiceError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_classify_failure() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(
            classify_failure(401, body),
            ServiceError::Authentication("invalid x-api-key".to_string())
        );
        assert!(matches!(classify_failure(429, "slow down"), ServiceError::RateLimited(_)));
        assert_eq!(
            classify_failure(529, "overloaded"),
            ServiceError::Api {
                status: 529,
                message: "overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = AnalysisRequest {
            instruction: "Review.\nRespond in English.".to_string(),
            payload: "The tenant pays rent.".to_string(),
            model: "claude-test".to_string(),
            max_output_tokens: 512,
        };
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_output_tokens,
            system: &request.instruction,
            messages: vec![MessageParam {
                role: "user",
                content: &request.payload,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["system"], "Review.\nRespond in English.");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let mut config = crate::config::Config::default().model;
        config.api_base = "http://localhost:9999/v1/".to_string();
        let client = AnthropicClient::new("key", &config).unwrap();
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }
}
