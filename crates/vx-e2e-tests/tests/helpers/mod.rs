//! Shared test harness for E2E integration tests.
//!
//! Runs the real assistant loop against file-backed stores in a scratch
//! directory, with recording speech/executor collaborators and optional
//! wiremock AI endpoints.

#![allow(dead_code)]

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vx_assistant::assistant::{Assistant, Collaborators, Tick};
use vx_assistant::config::AssistantConfig;
use vx_assistant::mock::{RecordingExecutor, RecordingSpeaker, ScriptedListener, ScriptedProposals};
use vx_intent::event_log::parse_lines;
use vx_intent::store::parse_rules;
use vx_protocol::{LogEntry, Mode, Rule};

/// Path the mock AI router answers on.
pub const AI_PATH: &str = "/models/intent";
pub const AI_TOKEN: &str = "hf-e2e-token";

/// End-to-end harness: one assistant over one scratch directory.
pub struct TestHarness {
    /// Rule store, event log and plan output all live here.
    pub dir: TempDir,
    pub config: AssistantConfig,
    pub speaker: RecordingSpeaker,
    pub executor: RecordingExecutor,
    pub proposals: ScriptedProposals,
    pub assistant: Assistant,
}

impl TestHarness {
    /// AI router disabled: unmatched utterances resolve to UNKNOWN.
    pub fn offline() -> Self {
        Self::build(|_| {}, ScriptedProposals::none())
    }

    /// AI router pointed at `server`.
    pub fn with_ai(server: &MockServer) -> Self {
        let endpoint = format!("{}{AI_PATH}", server.uri());
        Self::build(
            move |config| {
                config.ai_router.enabled = true;
                config.ai_router.endpoint = endpoint;
                config.ai_router.api_key = Some(AI_TOKEN.into());
                config.ai_router.timeout_secs = 2;
            },
            ScriptedProposals::none(),
        )
    }

    pub fn in_mode(mode: Mode) -> Self {
        Self::build(|config| config.default_mode = mode, ScriptedProposals::none())
    }

    pub fn with_proposals(proposals: ScriptedProposals) -> Self {
        Self::build(|_| {}, proposals)
    }

    pub fn build(customize: impl FnOnce(&mut AssistantConfig), proposals: ScriptedProposals) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AssistantConfig::default();
        config.ai_router.enabled = false;
        config.paths.rules = dir.path().join("data/learned_rules.json");
        config.paths.log = dir.path().join("data/logs.jsonl");
        config.paths.output_dir = dir.path().join("generated_project");
        config.speech.speak_timeout_secs = 1;
        customize(&mut config);

        let speaker = RecordingSpeaker::new();
        let executor = RecordingExecutor::new();
        let assistant = build_assistant(&config, &speaker, &executor, &proposals);

        Self {
            dir,
            config,
            speaker,
            executor,
            proposals,
            assistant,
        }
    }

    /// Simulate a process restart: fresh session, same files on disk.
    pub fn restart(&mut self) {
        self.assistant = build_assistant(&self.config, &self.speaker, &self.executor, &self.proposals);
    }

    /// Feed one utterance through the loop.
    pub async fn say(&mut self, text: &str) -> Tick {
        self.assistant.handle_utterance(text).await
    }

    /// Rules currently on disk.
    pub fn rules(&self) -> Vec<Rule> {
        std::fs::read_to_string(&self.config.paths.rules)
            .map(|content| parse_rules(&content))
            .unwrap_or_default()
    }

    /// Event log entries currently on disk.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        std::fs::read_to_string(&self.config.paths.log)
            .map(|content| parse_lines(&content))
            .unwrap_or_default()
    }

    /// Write raw lines to the event log, as an earlier run would have.
    pub fn seed_log(&self, entries: &[LogEntry]) {
        let mut content = String::new();
        for entry in entries {
            content.push_str(&serde_json::to_string(entry).unwrap());
            content.push('\n');
        }
        if let Some(parent) = self.config.paths.log.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&self.config.paths.log, content).unwrap();
    }
}

fn build_assistant(
    config: &AssistantConfig,
    speaker: &RecordingSpeaker,
    executor: &RecordingExecutor,
    proposals: &ScriptedProposals,
) -> Assistant {
    Assistant::from_config(
        config,
        Collaborators {
            listener: Box::new(ScriptedListener::default()),
            speaker: Box::new(speaker.clone()),
            executor: Box::new(executor.clone()),
            proposals: Box::new(proposals.clone()),
        },
    )
}

/// Mount a text-generation reply on `server`.
pub async fn mount_ai_reply(server: &MockServer, generated: &str) {
    Mock::given(method("POST"))
        .and(path(AI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "generated_text": generated }])),
        )
        .mount(server)
        .await;
}
