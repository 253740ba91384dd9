use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{classify_message, classify_transport, ErrorKind, ProviderError},
    llm::summarizer::{ProviderBudget, Summarizer},
};

/// Client for the Anthropic Messages API, used as the primary summarizer
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    budget: ProviderBudget,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum AnthropicError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        error_type: Option<String>,
        message: String,
    },
    #[error("No text content in response")]
    EmptyResponse,
}

impl AnthropicClient {
    const API_VERSION: &str = "2023-06-01";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".into(),
            budget: ProviderBudget::new(
                Self::SUMMARIZER_MODEL,
                Self::CONTEXT_WINDOW_LIMIT,
                Self::MAX_OUTPUT_TOKENS,
            ),
            timeout: Self::REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.budget.model = model.into();
        self
    }

    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.budget.max_input_tokens = max_input_tokens;
        self
    }

    /// Upper bound on a single request, from connect to the last body byte
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn send_message_request(
        &self,
        user_content: impl Into<String>,
    ) -> Result<MessagesResponse, AnthropicError> {
        let body = serde_json::json!({
            "model": self.budget.model,
            "max_tokens": self.budget.max_output_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, %status, "Failed to read error response body");
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            });
            return Err(parse_api_error(status.as_u16(), text));
        }

        Ok(resp.json::<MessagesResponse>().await?)
    }
}

fn parse_api_error(status: u16, text: String) -> AnthropicError {
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(ErrorEnvelope { error }) => AnthropicError::Api {
            status,
            error_type: error.error_type,
            message: error.message.unwrap_or(text),
        },
        Err(_) => AnthropicError::Api {
            status,
            error_type: None,
            message: text,
        },
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

impl AnthropicError {
    pub fn kind(&self) -> ErrorKind {
        let AnthropicError::Api {
            status,
            error_type,
            message,
        } = self
        else {
            return match self {
                AnthropicError::Request(e) => classify_transport(e),
                _ => ErrorKind::Unknown,
            };
        };

        if let Some(kind) = classify_message(message) {
            return kind;
        }
        if message.contains("prompt is too long") {
            return ErrorKind::ContextTooLong;
        }

        match (*status, error_type.as_deref()) {
            (429, _) | (_, Some("rate_limit_error")) => ErrorKind::RateLimited,
            (401 | 403, _) | (_, Some("authentication_error" | "permission_error")) => {
                ErrorKind::Unauthorized
            }
            (503 | 529, _) | (_, Some("overloaded_error")) => ErrorKind::Unavailable,
            (400..=499, _) | (_, Some("invalid_request_error")) => ErrorKind::InvalidRequest,
            _ if message.contains("credit balance") => ErrorKind::InvalidRequest,
            _ => ErrorKind::Unknown,
        }
    }
}

impl From<AnthropicError> for ProviderError {
    fn from(err: AnthropicError) -> Self {
        ProviderError::new(err.kind(), format!("Anthropic {err}"))
    }
}

impl Summarizer for AnthropicClient {
    const CONTEXT_WINDOW_LIMIT: usize = 100_000 / 2;
    const SUMMARIZER_MODEL: &'static str = "claude-3-sonnet-20240229";

    fn budget(&self) -> &ProviderBudget {
        &self.budget
    }

    async fn complete(&self, prompt: String) -> Result<String, ProviderError> {
        let response = self
            .send_message_request(prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| AnthropicError::EmptyResponse.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, body: &str) -> AnthropicError {
        parse_api_error(status, body.to_string())
    }

    #[test]
    fn test_low_credit_balance_is_invalid_request() {
        let err = api_error(
            400,
            r#"{"type":"error","error":{"type":"invalid_request_error","message":"Your credit balance is too low to access the Anthropic API."}}"#,
        );

        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        let provider_err = ProviderError::from(err);
        assert!(provider_err.triggers_fallback());
        assert!(provider_err.message.contains("credit balance"));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            api_error(429, r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow"}}"#).kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(api_error(401, "unauthorized").kind(), ErrorKind::Unauthorized);
        assert_eq!(api_error(403, "forbidden").kind(), ErrorKind::Unauthorized);
        assert_eq!(api_error(503, "down").kind(), ErrorKind::Unavailable);
        assert_eq!(
            api_error(529, r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(api_error(404, "no such model").kind(), ErrorKind::InvalidRequest);
        assert_eq!(api_error(500, "boom").kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_message_classification_wins_over_status() {
        assert_eq!(
            api_error(400, r#"{"type":"error","error":{"type":"invalid_request_error","message":"prompt is too long: 210000 tokens > 200000 maximum"}}"#).kind(),
            ErrorKind::ContextTooLong
        );
        assert_eq!(
            api_error(429, "insufficient_quota").kind(),
            ErrorKind::QuotaExhausted
        );
    }

    #[test]
    fn test_unparseable_body_keeps_raw_text() {
        let err = api_error(502, "<html>Bad Gateway</html>");
        let AnthropicError::Api {
            error_type,
            message,
            ..
        } = &err
        else {
            panic!("expected api error");
        };
        assert!(error_type.is_none());
        assert_eq!(message, "<html>Bad Gateway</html>");
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_default_budget() {
        let client = AnthropicClient::new("key").with_max_input_tokens(12_500);
        assert_eq!(client.budget().model, "claude-3-sonnet-20240229");
        assert_eq!(client.budget().max_input_tokens, 12_500);
        assert_eq!(AnthropicClient::CONTEXT_WINDOW_LIMIT, 50_000);
    }
}
