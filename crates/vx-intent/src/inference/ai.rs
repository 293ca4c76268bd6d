//! AI router — remote text model fallback for utterances no rule matches.
//!
//! Talks to a HuggingFace-style text-generation endpoint. Model output is
//! free-form, so the first balanced `{...}` is cut out of it, parsed, and
//! forced into the canonical intent schema. Every failure path (disabled,
//! no credential, transport error, timeout, no JSON, bad JSON, schema
//! violation) yields `UNKNOWN` with source `AI` and confidence 0.4.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vx_protocol::{DEFAULT_AI_CONFIDENCE, Intent, IntentId, IntentSource};

use super::IntentEngine;

/// Prompt template; `{text}` is replaced with the utterance.
const PROMPT_TEMPLATE: &str = r#"Return ONLY valid JSON. No text. No explanations.

User input: "{text}"

Schema:
{
  "intent_id": "OPEN_WEBSITE | OPEN_APP | SEARCH_WEB | MODE_SWITCH | NAVIGATION | UNKNOWN",
  "params": {},
  "confidence": 0.0
}
"#;

/// Configuration for the remote intent classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct AiRouterConfig {
    /// Full model inference URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Explicit token; takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the remote fallback is used at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co/models/HuggingFaceH4/zephyr-7b-beta".into()
}
fn default_api_key_env() -> String {
    "HUGGINGFACE_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_enabled() -> bool {
    true
}

impl Default for AiRouterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
        }
    }
}

impl AiRouterConfig {
    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Text-generation request body.
#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Serialize)]
struct GenerationParameters {
    temperature: f64,
    max_new_tokens: u32,
    return_full_text: bool,
}

/// Why a classification attempt produced no usable intent.
#[derive(Debug, thiserror::Error)]
enum ClassifyError {
    #[error("AI router disabled")]
    Disabled,
    #[error("API key missing (env {0})")]
    MissingKey(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("response has no generated_text")]
    NoGeneratedText,
    #[error("no JSON object in model output")]
    NoJson,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("schema violation: {0}")]
    Schema(String),
}

/// Remote fallback classifier.
pub struct AiRouter {
    client: reqwest::Client,
    config: AiRouterConfig,
}

impl AiRouter {
    pub fn new(config: AiRouterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Classify `text`. Never fails: any problem yields the canonical
    /// `UNKNOWN` intent.
    pub async fn classify(&self, text: &str) -> Intent {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, self.try_classify(text)).await {
            Ok(Ok(intent)) => {
                tracing::info!(
                    intent_id = %intent.intent_id,
                    confidence = intent.confidence,
                    "AI router parsed intent"
                );
                intent
            }
            Ok(Err(ClassifyError::Disabled)) => {
                tracing::debug!("AI router disabled, returning UNKNOWN");
                Intent::unknown()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "AI routing failed");
                Intent::unknown()
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.config.timeout_secs, "AI routing timed out");
                Intent::unknown()
            }
        }
    }

    async fn try_classify(&self, text: &str) -> Result<Intent, ClassifyError> {
        if !self.config.enabled {
            return Err(ClassifyError::Disabled);
        }
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| ClassifyError::MissingKey(self.config.api_key_env.clone()))?;

        let prompt = PROMPT_TEMPLATE.replace("{text}", text);
        let body = GenerationRequest {
            inputs: &prompt,
            parameters: GenerationParameters {
                temperature: 0.2,
                max_new_tokens: 200,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassifyError::Status(response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;
        let generated = generated_text(&body).ok_or(ClassifyError::NoGeneratedText)?;
        tracing::debug!(raw = %truncate(generated, 500), "AI raw output");

        let json_text = extract_json_object(generated).ok_or(ClassifyError::NoJson)?;
        let parsed: Value = serde_json::from_str(json_text)
            .map_err(|e| ClassifyError::InvalidJson(e.to_string()))?;
        canonical_intent(&parsed).map_err(ClassifyError::Schema)
    }
}

#[async_trait]
impl IntentEngine for AiRouter {
    async fn parse(&self, text: &str) -> Option<Intent> {
        Some(self.classify(text).await)
    }

    fn tier_name(&self) -> &str {
        "ai"
    }
}

/// Pull `generated_text` out of either `[{"generated_text": ..}]` or
/// `{"generated_text": ..}`.
fn generated_text(body: &Value) -> Option<&str> {
    let item = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    item.get("generated_text")?.as_str()
}

/// First balanced `{...}` substring of `text`.
///
/// Braces inside JSON string literals are ignored. If an opening brace
/// never closes, scanning resumes at the next one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let starts = text.char_indices().filter(|(_, c)| *c == '{').map(|(i, _)| i);
    for start in starts {
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
    }
    None
}

/// Byte length of the balanced object at the start of `s`, if it closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Force a parsed model object into the intent schema.
///
/// Missing fields take defaults (`UNKNOWN`, `{}`, 0.4). A present but
/// out-of-range or non-numeric confidence is a schema violation.
pub fn canonical_intent(raw: &Value) -> Result<Intent, String> {
    let map = raw.as_object().ok_or("model output is not an object")?;

    let intent_id = match map.get("intent_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => IntentId::from(s.trim()),
        Some(Value::String(_)) | Some(Value::Null) | None => IntentId::Unknown,
        Some(other) => return Err(format!("intent_id is not a string: {other}")),
    };

    let params = match map.get("params") {
        Some(Value::Object(p)) => p.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(other) => return Err(format!("params is not an object: {other}")),
    };

    let confidence = match map.get("confidence") {
        None | Some(Value::Null) => DEFAULT_AI_CONFIDENCE,
        Some(v) => v
            .as_f64()
            .ok_or_else(|| format!("confidence is not a number: {v}"))?,
    };

    let intent = Intent::new(intent_id, params, confidence, IntentSource::Ai);
    intent.validate().map_err(|e| e.to_string())?;
    Ok(intent)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
