/// LLM Client: the single point of entry for every model call in resume-helper.
///
/// ARCHITECTURAL RULE: no other module talks to a model vendor directly.
/// Pipelines receive a `&dyn LlmProvider` chosen once at the CLI boundary.
///
/// Structured output is schema-constrained at the vendor (tool call, json_schema
/// response format, or responseSchema). A reply that does not deserialize into the
/// requested shape is `LlmError::Malformed`; there is no best-effort text parsing.
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::config::Config;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub mod stub;

/// Output token ceiling shared by every backend.
pub const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("{var} is not set. Copy .env.example to .env and add your key.")]
    MissingApiKey { var: &'static str },

    #[error("response did not match the {shape} shape: {reason}")]
    Malformed { shape: &'static str, reason: String },
}

/// Model backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Claude,
    Openai,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Openai => "openai",
            Provider::Gemini => "gemini",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Provider::Claude),
            "openai" => Ok(Provider::Openai),
            "gemini" => Ok(Provider::Gemini),
            other => Err(format!(
                "Provider '{other}' is not implemented. Valid providers: claude, openai, gemini"
            )),
        }
    }
}

/// A data shape a model can be asked to produce.
pub trait StructuredShape: DeserializeOwned {
    /// Name sent to the vendor as the tool / schema name.
    const NAME: &'static str;

    /// JSON schema for one value of this shape. Kept to the subset every backend
    /// accepts: `type`, `properties`, `required`, `items`, `enum`.
    fn json_schema() -> Value;
}

/// Schema request handed to a backend for one structured call.
#[derive(Debug, Clone)]
pub struct ShapeSpec {
    pub name: &'static str,
    pub description: String,
    pub schema: Value,
}

impl ShapeSpec {
    pub fn one<T: StructuredShape>() -> Self {
        Self {
            name: T::NAME,
            description: format!("Return a single {} object.", T::NAME),
            schema: T::json_schema(),
        }
    }

    /// Vendors require an object at the top level, so lists travel as `{ "items": [...] }`.
    pub fn list_of<T: StructuredShape>() -> Self {
        Self {
            name: T::NAME,
            description: format!("Return every {} found, wrapped in `items`.", T::NAME),
            schema: json!({
                "type": "object",
                "properties": {
                    "items": { "type": "array", "items": T::json_schema() }
                },
                "required": ["items"]
            }),
        }
    }
}

/// Capability set every model backend implements.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_name(&self) -> &str;

    /// Free-text completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Completion constrained to `shape.schema`, returned as raw JSON.
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        shape: &ShapeSpec,
    ) -> Result<Value, LlmError>;
}

impl<'a> dyn LlmProvider + 'a {
    /// Asks for a list of `T` and deserializes every element.
    pub async fn complete_structured<T: StructuredShape>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Vec<T>, LlmError> {
        let value = self
            .complete_json(system, user, &ShapeSpec::list_of::<T>())
            .await?;
        parse_list(value)
    }

    /// Asks for exactly one `T`.
    pub async fn complete_structured_one<T: StructuredShape>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, LlmError> {
        let value = self
            .complete_json(system, user, &ShapeSpec::one::<T>())
            .await?;
        parse_one(value)
    }
}

pub(crate) fn parse_one<T: StructuredShape>(value: Value) -> Result<T, LlmError> {
    serde_json::from_value(value).map_err(|e| LlmError::Malformed {
        shape: T::NAME,
        reason: e.to_string(),
    })
}

pub(crate) fn parse_list<T: StructuredShape>(value: Value) -> Result<Vec<T>, LlmError> {
    let Value::Object(mut map) = value else {
        return Err(LlmError::Malformed {
            shape: T::NAME,
            reason: "expected an object with an `items` array".to_string(),
        });
    };
    let items = map.remove("items").ok_or_else(|| LlmError::Malformed {
        shape: T::NAME,
        reason: "missing `items`".to_string(),
    })?;
    serde_json::from_value(items).map_err(|e| LlmError::Malformed {
        shape: T::NAME,
        reason: e.to_string(),
    })
}

/// Parses a JSON string returned as message text by a json-mode backend.
pub(crate) fn parse_json_text(text: &str, shape: &ShapeSpec) -> Result<Value, LlmError> {
    serde_json::from_str(text.trim()).map_err(|e| LlmError::Malformed {
        shape: shape.name,
        reason: e.to_string(),
    })
}

/// Builds the backend selected on the command line.
pub fn build_provider(
    provider: Provider,
    config: &Config,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match provider {
        Provider::Claude => {
            let key = require_key(&config.anthropic_api_key, "ANTHROPIC_API_KEY")?;
            Ok(Box::new(anthropic::AnthropicProvider::new(key)))
        }
        Provider::Openai => {
            let key = require_key(&config.openai_api_key, "OPENAI_API_KEY")?;
            Ok(Box::new(openai::OpenAiProvider::new(key)))
        }
        Provider::Gemini => {
            let key = require_key(&config.gemini_api_key, "GEMINI_API_KEY")?;
            Ok(Box::new(gemini::GeminiProvider::new(key)))
        }
    }
}

fn require_key(key: &Option<String>, var: &'static str) -> Result<String, LlmError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .ok_or(LlmError::MissingApiKey { var })
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

#[derive(Debug, Deserialize)]
struct VendorError {
    error: VendorErrorBody,
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    message: String,
}

/// Sends a request built by `build`, retrying on transport errors, 429 and 5xx
/// with exponential backoff (1s, 2s). Other failures return immediately.
pub(crate) async fn send_with_retry<F>(
    vendor: &str,
    build: F,
) -> Result<reqwest::Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{vendor} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{vendor} API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: vendor_error_message(body),
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

fn vendor_error_message(body: String) -> String {
    serde_json::from_str::<VendorError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
