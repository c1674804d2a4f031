use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::Config;
use crate::errors::ProviderError;

use super::{Message, Provider};

/// OpenAI client for the chat completions API
///
/// Also works against OpenAI-compatible endpoints by pointing `endpoint`
/// somewhere else.
#[derive(Debug)]
pub struct OpenAi {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Model name to request
    model: String,
    /// Temperature for generation
    temperature: f32,
    /// Nucleus sampling parameter
    top_p: f32,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<Message>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p (nucleus sampling)
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the maximum number of tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A message as it comes back from the API
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    /// Content of the message
    pub content: String,
}

/// Individual choice in a chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ResponseMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// The generated choices
    pub choices: Vec<ChatChoice>,
    /// Token usage information, when the service reports it
    pub usage: Option<TokenUsage>,
}

impl OpenAi {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature: 0.3,
            top_p: 1.0,
            max_tokens: None,
        }
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(
            config.provider.api_key.clone(),
            config.provider.endpoint.clone(),
            config.translation.model.clone(),
            config.provider.timeout_secs,
        );
        client.temperature = config.translation.temperature;
        client.top_p = config.translation.top_p;
        client.max_tokens = config.provider.max_tokens;
        client
    }

    /// Complete a chat request
    pub async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let api_url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::TimedOut(format!("OpenAI API request timed out: {}", e))
                } else if e.is_connect() {
                    ProviderError::ConnectionError(format!(
                        "Failed to connect to OpenAI API: {}",
                        e
                    ))
                } else {
                    ProviderError::RequestFailed(format!(
                        "Failed to send request to OpenAI API: {}",
                        e
                    ))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(error_text),
                429 => ProviderError::RateLimitExceeded(error_text),
                code => ProviderError::ApiError { status_code: code, message: error_text },
            });
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("OpenAI API response: {}", e)))
    }

    /// Test the connection to the API with a minimal request
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = ChatCompletionRequest::new(
            self.model.clone(),
            vec![Message::user("Hello")],
        )
        .max_tokens(10);

        self.complete(request).await?;
        Ok(())
    }
}

#[async_trait]
impl Provider for OpenAi {
    async fn translate(
        &self,
        instructions: &Message,
        prompt: &Message,
    ) -> Result<String, ProviderError> {
        let mut request = ChatCompletionRequest::new(
            self.model.clone(),
            vec![instructions.clone(), prompt.clone()],
        )
        .temperature(self.temperature)
        .top_p(self.top_p);

        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }

        let response = self.complete(request).await?;

        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone()),
            None => Err(ProviderError::ParseError(
                "OpenAI API returned no choices".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}
