//! OpenAI Chat Completions backend. Structured output uses `response_format: json_schema`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    http_client, parse_json_text, send_with_retry, LlmError, LlmProvider, ShapeSpec, MAX_TOKENS,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-5.2";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_completion_tokens: u32,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ResponseFormat<'a> {
    #[serde(rename = "json_schema")]
    JsonSchema { json_schema: JsonSchemaDefinition<'a> },
}

// Non-strict: strict mode demands every property be required, which the optional
// project fields are not.
#[derive(Debug, Serialize)]
struct JsonSchemaDefinition<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatCompletionResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
    }
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            endpoint: OPENAI_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn call(&self, body: &ChatRequest<'_>) -> Result<String, LlmError> {
        let response = send_with_retry("OpenAI", || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(body)
        })
        .await?;

        let parsed: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        parsed.into_text().ok_or(LlmError::EmptyContent)
    }
}

fn build_request<'a>(
    system: &'a str,
    user: &'a str,
    shape: Option<&'a ShapeSpec>,
) -> ChatRequest<'a> {
    ChatRequest {
        model: MODEL,
        max_completion_tokens: MAX_TOKENS,
        messages: [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
        response_format: shape.map(|s| ResponseFormat::JsonSchema {
            json_schema: JsonSchemaDefinition {
                name: s.name,
                strict: false,
                schema: &s.schema,
            },
        }),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        MODEL
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.call(&build_request(system, user, None)).await
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        shape: &ShapeSpec,
    ) -> Result<Value, LlmError> {
        let text = self.call(&build_request(system, user, Some(shape))).await?;
        parse_json_text(&text, shape)
    }
}
