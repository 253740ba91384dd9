use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{classify_message, classify_transport, ErrorKind, ProviderError},
    llm::summarizer::{ProviderBudget, Summarizer},
};

/// Client for the OpenAI Chat Completions API, used as the fallback summarizer
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    budget: ProviderBudget,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("No content in response")]
    EmptyResponse,
}

impl OpenAIClient {
    const TEMPERATURE: f32 = 0.5;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
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

    pub async fn send_completion_request(
        &self,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": self.budget.model,
            "max_tokens": self.budget.max_output_tokens,
            "temperature": Self::TEMPERATURE,
            "messages": [
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

fn parse_api_error(status: u16, text: String) -> OpenAIError {
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(ErrorEnvelope { error }) => OpenAIError::Api {
            status,
            code: error.code.or(error.error_type),
            message: error.message.unwrap_or(text),
        },
        Err(_) => OpenAIError::Api {
            status,
            code: None,
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
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl OpenAIError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpenAIError::Request(e) => classify_transport(e),
            OpenAIError::EmptyResponse => ErrorKind::Unknown,
            OpenAIError::Api {
                status,
                code,
                message,
            } => code
                .as_deref()
                .and_then(classify_message)
                .or_else(|| classify_message(message))
                .unwrap_or(match *status {
                    429 => ErrorKind::RateLimited,
                    401 => ErrorKind::Unauthorized,
                    503 => ErrorKind::Unavailable,
                    400..=499 => ErrorKind::InvalidRequest,
                    _ => ErrorKind::Unknown,
                }),
        }
    }
}

impl From<OpenAIError> for ProviderError {
    fn from(err: OpenAIError) -> Self {
        ProviderError::new(err.kind(), format!("OpenAI {err}"))
    }
}

impl Summarizer for OpenAIClient {
    const CONTEXT_WINDOW_LIMIT: usize = 8_192 / 2;
    const SUMMARIZER_MODEL: &'static str = "gpt-4";

    fn budget(&self) -> &ProviderBudget {
        &self.budget
    }

    async fn complete(&self, prompt: String) -> Result<String, ProviderError> {
        let response = self
            .send_completion_request(prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAIError::EmptyResponse.into())
    }
}
