//! AI proposal engine — text rewrites and code generation.
//!
//! Calls an OpenAI-compatible chat completions endpoint (Groq by default)
//! and validates the reply against the proposal schema. Proposals are never
//! applied here: the caller decides what to do with them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vx_intent::inference::ai::extract_json_object;
use vx_protocol::{Proposal, ProposalKind};

const IMPROVE_PROMPT: &str = "Rewrite the given text.\n\
Return STRICT JSON only:\n\
{ \"type\": \"IMPROVE_TEXT\", \"confidence\": <0.0-1.0>, \"result\": { \"text\": \"<rewritten>\" } }\n\
No explanations.";

const CODE_PROMPT: &str = "Generate source code only.\n\
Return STRICT JSON:\n\
{ \"type\": \"CODE_GENERATION\", \"confidence\": <0.0-1.0>, \"result\": { \"files\": { \"<filename>\": \"<code>\" } } }\n\
No markdown. No explanations.";

const IMPROVE_TEMPERATURE: f64 = 0.4;
const CODE_TEMPERATURE: f64 = 0.3;

/// Source of AI proposals.
#[async_trait]
pub trait ProposalEngine: Send + Sync {
    /// Ask for a rewrite of `text`.
    async fn improve_text(&self, text: &str) -> Option<Proposal>;

    /// Ask for files implementing `task`.
    async fn generate_code(&self, task: &str) -> Option<Proposal>;
}

/// Configuration for the chat completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".into()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_enabled() -> bool {
    true
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
        }
    }
}

/// Errors from a proposal request.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error("proposal engine disabled")]
    Disabled,

    #[error("API key missing (env {0})")]
    MissingKey(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("response has no message content")]
    EmptyResponse,

    #[error("no JSON object in model output")]
    NoJson,

    #[error("proposal does not match schema: {0}")]
    Schema(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Proposal engine over OpenAI-compatible chat completions.
pub struct ChatProposalEngine {
    client: reqwest::Client,
    config: ProposalConfig,
}

impl ChatProposalEngine {
    pub fn new(config: ProposalConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Send one request and validate the reply.
    pub async fn request(
        &self,
        system_prompt: &str,
        input: &str,
        temperature: f64,
    ) -> Result<Proposal, ProposalError> {
        if !self.config.enabled {
            return Err(ProposalError::Disabled);
        }
        let api_key = self
            .config
            .api_key
            .clone()
            .or_else(|| std::env::var(&self.config.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProposalError::MissingKey(self.config.api_key_env.clone()))?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProposalError::Status(response.status()));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ProposalError::EmptyResponse)?;

        parse_proposal(&content)
    }

    async fn propose(
        &self,
        expected: ProposalKind,
        system_prompt: &str,
        input: &str,
        temperature: f64,
    ) -> Option<Proposal> {
        match self.request(system_prompt, input, temperature).await {
            Ok(proposal) => {
                tracing::info!(
                    kind = ?proposal.kind,
                    confidence = proposal.confidence,
                    "proposal received"
                );
                if proposal.kind != expected {
                    tracing::warn!(expected = ?expected, got = ?proposal.kind, "unexpected proposal type");
                }
                Some(proposal)
            }
            Err(ProposalError::Disabled) => {
                tracing::debug!("proposal engine disabled");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "proposal request failed");
                None
            }
        }
    }
}

#[async_trait]
impl ProposalEngine for ChatProposalEngine {
    async fn improve_text(&self, text: &str) -> Option<Proposal> {
        self.propose(
            ProposalKind::ImproveText,
            IMPROVE_PROMPT,
            text,
            IMPROVE_TEMPERATURE,
        )
        .await
    }

    async fn generate_code(&self, task: &str) -> Option<Proposal> {
        self.propose(ProposalKind::CodeGeneration, CODE_PROMPT, task, CODE_TEMPERATURE)
            .await
    }
}

/// Cut the JSON object out of `content` and check it against the schema.
pub fn parse_proposal(content: &str) -> Result<Proposal, ProposalError> {
    let json = extract_json_object(content).ok_or(ProposalError::NoJson)?;
    let proposal: Proposal =
        serde_json::from_str(json).map_err(|e| ProposalError::Schema(e.to_string()))?;
    proposal
        .validate()
        .map_err(|e| ProposalError::Schema(e.to_string()))?;
    Ok(proposal)
}
