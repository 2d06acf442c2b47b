//! Anthropic Messages API backend.
//!
//! Structured output is requested as a forced tool call whose `input_schema` is
//! the shape schema; the tool input is the structured value.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{http_client, send_with_retry, LlmError, LlmProvider, ShapeSpec, MAX_TOKENS};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'static str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    pub name: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AnthropicResponse {
    /// Text of the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }

    /// Input of the `tool_use` block for the named tool.
    pub fn tool_input(&self, tool: &str) -> Option<&Value> {
        self.content
            .iter()
            .find(|b| b.block_type == "tool_use" && b.name.as_deref() == Some(tool))
            .and_then(|b| b.input.as_ref())
    }
}

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            endpoint: ANTHROPIC_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn call(&self, body: &AnthropicRequest<'_>) -> Result<AnthropicResponse, LlmError> {
        let response = send_with_retry("Anthropic", || {
            self.client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(body)
        })
        .await?;

        let parsed: AnthropicResponse = response.json().await?;
        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );
        Ok(parsed)
    }
}

fn build_request<'a>(
    system: &'a str,
    user: &'a str,
    shape: Option<&'a ShapeSpec>,
) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model: MODEL,
        max_tokens: MAX_TOKENS,
        system,
        messages: vec![AnthropicMessage {
            role: "user",
            content: user,
        }],
        tools: shape.map(|s| {
            vec![AnthropicTool {
                name: s.name,
                description: &s.description,
                input_schema: &s.schema,
            }]
        }),
        tool_choice: shape.map(|s| ToolChoice {
            choice_type: "tool",
            name: s.name,
        }),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        MODEL
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let response = self.call(&build_request(system, user, None)).await?;
        response
            .text()
            .map(String::from)
            .ok_or(LlmError::EmptyContent)
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        shape: &ShapeSpec,
    ) -> Result<Value, LlmError> {
        let response = self.call(&build_request(system, user, Some(shape))).await?;
        response
            .tool_input(shape.name)
            .cloned()
            .ok_or_else(|| LlmError::Malformed {
                shape: shape.name,
                reason: "no tool_use block in response".to_string(),
            })
    }
}
