//! Scripted collaborators for driving the assistant in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vx_protocol::{Intent, Proposal};

use crate::executor::{ActionExecutor, DescribingExecutor};
use crate::proposal::ProposalEngine;
use crate::speech::{Listener, Speaker, SpeechError, SpeechResult};

/// Replays a fixed list of utterances, then reports the input closed.
/// A `None` entry is a tick where nothing was heard.
#[derive(Default)]
pub struct ScriptedListener {
    script: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedListener {
    pub fn new<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(utterances.into_iter().map(|u| Some(u.into())).collect()),
        }
    }

    /// Script with explicit silent ticks.
    pub fn from_ticks(ticks: Vec<Option<String>>) -> Self {
        Self {
            script: Mutex::new(ticks.into()),
        }
    }
}

#[async_trait]
impl Listener for ScriptedListener {
    async fn listen(&self) -> SpeechResult<Option<String>> {
        let next = self
            .script
            .lock()
            .map_err(|_| SpeechError::Closed)?
            .pop_front();
        next.ok_or(SpeechError::Closed)
    }
}

/// Records everything spoken or shown. Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    shown: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, message: &str) -> SpeechResult<()> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(message.to_string());
        }
        Ok(())
    }

    async fn show(&self, text: &str) -> SpeechResult<()> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(text.to_string());
        }
        Ok(())
    }
}

/// Records executed intents and answers like [`DescribingExecutor`].
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<Intent>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<Intent> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, intent: &Intent) -> Option<String> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(intent.clone());
        }
        DescribingExecutor::describe(intent)
    }
}

/// Returns canned proposals and records the inputs it was asked about.
#[derive(Clone, Default)]
pub struct ScriptedProposals {
    improve: Option<Proposal>,
    code: Option<Proposal>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProposals {
    /// Engine that never produces a proposal.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_improve(mut self, proposal: Proposal) -> Self {
        self.improve = Some(proposal);
        self
    }

    pub fn with_code(mut self, proposal: Proposal) -> Self {
        self.code = Some(proposal);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, input: &str) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(input.to_string());
        }
    }
}

#[async_trait]
impl ProposalEngine for ScriptedProposals {
    async fn improve_text(&self, text: &str) -> Option<Proposal> {
        self.record(text);
        self.improve.clone()
    }

    async fn generate_code(&self, task: &str) -> Option<Proposal> {
        self.record(task);
        self.code.clone()
    }
}
