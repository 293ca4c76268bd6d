//! Assistant configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use vx_intent::{AiRouterConfig, ConfidenceLadder};
use vx_protocol::Mode;

use crate::proposal::ProposalConfig;

/// Top-level configuration for the assistant. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    /// Mode the session starts in.
    #[serde(default)]
    pub default_mode: Mode,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub log_json: bool,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Remote intent classifier.
    #[serde(default)]
    pub ai_router: AiRouterConfig,
    /// Text rewrite / code generation.
    #[serde(default)]
    pub proposals: ProposalConfig,
    #[serde(default)]
    pub confidence_ladder: ConfidenceLadder,
}

/// Where state lives on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Rule store shared by the router, learner, and log miner.
    #[serde(default = "default_rules_path")]
    pub rules: PathBuf,
    /// Append-only event log.
    #[serde(default = "default_log_path")]
    pub log: PathBuf,
    /// Directory approved plans are written under.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("data/learned_rules.json")
}
fn default_log_path() -> PathBuf {
    PathBuf::from("data/logs.jsonl")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated_project")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules: default_rules_path(),
            log: default_log_path(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Hard limit on one listen call.
    #[serde(default = "default_listen_timeout")]
    pub listen_timeout_secs: u64,
    /// Hard limit on one speak call.
    #[serde(default = "default_speak_timeout")]
    pub speak_timeout_secs: u64,
}

fn default_listen_timeout() -> u64 {
    30
}
fn default_speak_timeout() -> u64 {
    10
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: default_listen_timeout(),
            speak_timeout_secs: default_speak_timeout(),
        }
    }
}

impl AssistantConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
