use std::time::Duration;

use async_trait::async_trait;
use coach_config::OpenAiSettings;
use serde::{Deserialize, Serialize};

use super::error::AiError;
use super::retry::RetryPolicy;

/// One system/user prompt pair sent to the text-generation capability.
/// Responses are always requested as schema-constrained JSON objects.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Seam over the text-generation capability. The labeler and the analyzer
/// share one client; tests substitute counting fakes.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiChatClient {
    client: reqwest::Client,
    settings: OpenAiSettings,
    retry: RetryPolicy,
}

impl OpenAiChatClient {
    pub fn new(settings: OpenAiSettings, retry: RetryPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            settings,
            retry,
        }
    }

    async fn complete_once(&self, api_key: &str, request: &ChatRequest) -> Result<String, AiError> {
        let body = ChatCompletionBody {
            model: self.settings.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::AnalysisEngine(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::AnalysisEngine(format!(
                "upstream returned {status}: {detail}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::AnalysisEngine(format!("invalid response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::AnalysisEngine("empty completion".to_string()))
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
        let api_key = self
            .settings
            .api_key
            .clone()
            .ok_or(AiError::Unconfigured("openai.api_key"))?;

        self.retry
            .run("chat_completion", || self.complete_once(&api_key, &request))
            .await
    }
}
