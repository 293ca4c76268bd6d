//! The assistant loop — one utterance at a time, fully resolved before the
//! next is heard.
//!
//! Per utterance, first match wins:
//! 1. a pending slot is filled with the whole utterance and executed
//! 2. an active plan is approved or cancelled
//! 3. dictation mode: mode phrases, `clear dictation`, `make this better`,
//!    otherwise append
//! 4. navigation mode: rule-router navigation and mode switches only
//! 5. `create ...`: ask for a code proposal and stage it as the plan
//! 6. tiered routing, confidence gate, dispatch, learn

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use vx_intent::session::missing_slot;
use vx_intent::{
    AiRouter, ConfidenceLadder, EventLog, FileEventLog, FileRuleStore, Learner, LogMiner,
    RuleRouter, RuleStore, Session, StoreResult, TieredEngine, normalize,
};
use vx_intent::ladder::GateDecision;
use vx_protocol::{Intent, IntentId, LogEntry, Mode, ProposalKind};

use crate::config::AssistantConfig;
use crate::dictation::DictationBuffer;
use crate::executor::{ActionExecutor, DescribingExecutor};
use crate::plan::PendingPlan;
use crate::proposal::{ChatProposalEngine, ProposalEngine};
use crate::speech::{ConsoleListener, ConsoleSpeaker, Listener, Speaker, SpeechError, TimedListener};
use crate::writer::{self, WriteError};

/// Minimum confidence for a rewrite or code proposal to be used.
pub const MIN_PROPOSAL_CONFIDENCE: f64 = 0.8;

const APPROVE: &str = "approve";
const CANCEL: &str = "cancel";
const CLEAR_DICTATION: &str = "clear dictation";
const IMPROVE_DICTATION: &str = "make this better";
const CREATE_PREFIX: &str = "create ";

/// External collaborators the loop talks to.
pub struct Collaborators {
    pub listener: Box<dyn Listener>,
    pub speaker: Box<dyn Speaker>,
    pub executor: Box<dyn ActionExecutor>,
    pub proposals: Box<dyn ProposalEngine>,
}

impl Collaborators {
    /// Stdin/stdout stand-ins plus the configured proposal endpoint.
    pub fn console(config: &AssistantConfig) -> Self {
        Self {
            listener: Box::new(TimedListener::new(
                ConsoleListener::new(),
                Duration::from_secs(config.speech.listen_timeout_secs),
            )),
            speaker: Box::new(ConsoleSpeaker),
            executor: Box::new(DescribingExecutor),
            proposals: Box::new(ChatProposalEngine::new(config.proposals.clone())),
        }
    }
}

/// What handling one utterance did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Nothing usable was heard.
    Idle,
    /// A pending slot was filled and the completed intent executed.
    SlotFilled(Intent),
    /// The routed intent is missing a slot; the user was asked for it.
    AwaitingSlot(String),
    /// The plan was written; paths in name order.
    PlanApproved(Vec<PathBuf>),
    PlanCancelled,
    /// Writing the plan failed. An unsafe file name also discards the plan.
    PlanFailed,
    /// A code proposal was staged for approval.
    PlanProposed,
    /// No usable code proposal came back.
    NoProposal,
    /// Handled inside dictation mode.
    Dictation,
    ModeChanged(Mode),
    /// Routed and dispatched. `accepted` is the confidence gate's verdict.
    Dispatched { intent: Intent, accepted: bool },
    /// Heard in navigation mode but not a navigation command.
    Ignored,
}

pub struct Assistant {
    listener: Box<dyn Listener>,
    speaker: Mutex<Box<dyn Speaker>>,
    executor: Box<dyn ActionExecutor>,
    proposals: Box<dyn ProposalEngine>,
    engine: TieredEngine,
    ladder: ConfidenceLadder,
    learner: Learner,
    rules: Arc<dyn RuleStore>,
    log: Arc<dyn EventLog>,
    session: Session,
    dictation: DictationBuffer,
    plan: PendingPlan,
    output_dir: PathBuf,
    speak_timeout: Duration,
}

impl Assistant {
    pub fn new(
        config: &AssistantConfig,
        collaborators: Collaborators,
        rules: Arc<dyn RuleStore>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let engine = TieredEngine::new(
            Box::new(RuleRouter::new(rules.clone())),
            Box::new(AiRouter::new(config.ai_router.clone())),
        );
        Self {
            listener: collaborators.listener,
            speaker: Mutex::new(collaborators.speaker),
            executor: collaborators.executor,
            proposals: collaborators.proposals,
            engine,
            ladder: config.confidence_ladder.clone(),
            learner: Learner::with_default_policy(rules.clone()),
            rules,
            log,
            session: Session::new(config.default_mode),
            dictation: DictationBuffer::new(),
            plan: PendingPlan::new(),
            output_dir: config.paths.output_dir.clone(),
            speak_timeout: Duration::from_secs(config.speech.speak_timeout_secs),
        }
    }

    /// File-backed rule store and event log at the configured paths.
    pub fn from_config(config: &AssistantConfig, collaborators: Collaborators) -> Self {
        Self::new(
            config,
            collaborators,
            Arc::new(FileRuleStore::new(&config.paths.rules)),
            Arc::new(FileEventLog::new(&config.paths.log)),
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn dictation(&self) -> &DictationBuffer {
        &self.dictation
    }

    pub fn plan(&self) -> &PendingPlan {
        &self.plan
    }

    /// Promote mined rules from the event log. Run once before the loop.
    pub async fn mine_logs(&self) -> StoreResult<usize> {
        LogMiner::new()
            .run(self.log.as_ref(), self.rules.as_ref())
            .await
    }

    /// Run until the listener closes or `shutdown` resolves.
    ///
    /// Shutdown is only observed while waiting for input, so an utterance
    /// that has been heard is always fully handled.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(mode = %self.session.mode(), "entering main loop");

        loop {
            let heard = tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                heard = self.listener.listen() => heard,
            };

            match heard {
                Ok(Some(text)) => {
                    let tick = self.handle_utterance(&text).await;
                    tracing::debug!(?tick, "utterance handled");
                }
                Ok(None) => {}
                Err(SpeechError::Closed) => {
                    tracing::info!("input closed");
                    break;
                }
                Err(e) => tracing::warn!(error = %e, "listen failed"),
            }
        }
    }

    /// Run until the listener closes.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending()).await;
    }

    /// Handle one raw utterance.
    pub async fn handle_utterance(&mut self, raw: &str) -> Tick {
        let normalized = normalize(raw);
        tracing::debug!(raw, %normalized, mode = %self.session.mode(), "utterance");
        if normalized.is_empty() {
            return Tick::Idle;
        }

        if let Some(intent) = self.session.complete_slot(&normalized) {
            tracing::info!(
                intent_id = %intent.intent_id,
                params = ?intent.params,
                "slot completed"
            );
            self.execute_and_speak(&intent).await;
            return Tick::SlotFilled(intent);
        }

        if self.plan.is_active() {
            match normalized.as_str() {
                APPROVE => return self.approve_plan().await,
                CANCEL => {
                    self.plan.clear();
                    self.say("Plan cancelled").await;
                    return Tick::PlanCancelled;
                }
                _ => {}
            }
        }

        match self.session.mode() {
            Mode::Dictation => return self.handle_dictation(raw, &normalized).await,
            Mode::Navigation => return self.handle_navigation(&normalized).await,
            Mode::Command => {}
        }

        if normalized.starts_with(CREATE_PREFIX) {
            return self.propose_code(&normalized).await;
        }

        self.route_and_dispatch(&normalized).await
    }

    async fn route_and_dispatch(&mut self, normalized: &str) -> Tick {
        let mut intent = self.engine.resolve(normalized).await;
        if let Err(e) = intent.validate() {
            tracing::warn!(error = %e, intent_id = %intent.intent_id, "invalid intent, using UNKNOWN");
            intent = Intent::unknown();
        }
        self.append_log(LogEntry::intent_parsed(normalized, &intent))
            .await;

        if let Some(param) = missing_slot(&intent) {
            tracing::info!(intent_id = %intent.intent_id, param, "intent incomplete, asking");
            self.session.request_slot(param, intent.intent_id.clone());
            self.say(slot_prompt(param)).await;
            return Tick::AwaitingSlot(param.to_string());
        }

        let accepted = match self.ladder.evaluate(&intent) {
            GateDecision::Accepted => {
                tracing::info!(
                    source = %intent.source,
                    confidence = intent.confidence,
                    "confidence accepted"
                );
                true
            }
            GateDecision::Rejected { threshold } => {
                tracing::info!(
                    source = %intent.source,
                    confidence = intent.confidence,
                    threshold,
                    "confidence rejected"
                );
                self.append_log(LogEntry::intent_rejected(normalized, &intent, threshold))
                    .await;
                false
            }
        };

        // Rejected intents are still dispatched and offered to the learner.
        self.dispatch(&intent).await;

        match self.learner.learn(&intent, normalized).await {
            Ok(outcome) => tracing::debug!(?outcome, "learner"),
            Err(e) => tracing::warn!(error = %e, "failed to persist learned rule"),
        }

        Tick::Dispatched { intent, accepted }
    }

    async fn handle_navigation(&mut self, normalized: &str) -> Tick {
        let Some(intent) = self.engine.parse_local(normalized).await else {
            tracing::debug!(input = normalized, "navigation mode: no rule");
            return Tick::Ignored;
        };
        if !matches!(intent.intent_id, IntentId::Navigation | IntentId::ModeSwitch) {
            tracing::debug!(intent_id = %intent.intent_id, "navigation mode: ignoring");
            return Tick::Ignored;
        }
        if let Err(e) = intent.validate() {
            tracing::warn!(error = %e, intent_id = %intent.intent_id, "navigation mode: invalid intent");
            return Tick::Ignored;
        }

        let accepted = self.ladder.accepts(&intent);
        self.dispatch(&intent).await;
        Tick::Dispatched { intent, accepted }
    }

    async fn handle_dictation(&mut self, raw: &str, normalized: &str) -> Tick {
        if let Some(mode) = self.mode_phrase(normalized).await {
            self.dictation.clear();
            self.apply_mode(mode).await;
            return Tick::ModeChanged(mode);
        }

        match normalized {
            CLEAR_DICTATION => {
                self.dictation.clear();
                self.say("Dictation cleared").await;
            }
            IMPROVE_DICTATION => self.improve_dictation().await,
            _ => {
                self.dictation.append(raw.trim());
                let text = self.dictation.text().to_string();
                self.show(&text).await;
            }
        }
        Tick::Dictation
    }

    async fn improve_dictation(&mut self) {
        if self.dictation.is_empty() {
            self.say("Nothing to improve").await;
            return;
        }

        let proposal = self.proposals.improve_text(self.dictation.text()).await;
        let rewrite = proposal
            .as_ref()
            .filter(|p| p.kind == ProposalKind::ImproveText)
            .filter(|p| p.confidence >= MIN_PROPOSAL_CONFIDENCE)
            .and_then(|p| p.improved_text())
            .map(str::to_string);

        match rewrite {
            Some(text) => {
                self.dictation.replace(text);
                self.say("Updated dictation").await;
                let text = self.dictation.text().to_string();
                self.show(&text).await;
            }
            None => self.say("Rewrite failed").await,
        }
    }

    async fn propose_code(&mut self, task: &str) -> Tick {
        let files = self
            .proposals
            .generate_code(task)
            .await
            .filter(|p| p.kind == ProposalKind::CodeGeneration)
            .filter(|p| p.confidence >= MIN_PROPOSAL_CONFIDENCE)
            .map(|p| p.files())
            .filter(|files| !files.is_empty());

        let Some(files) = files else {
            self.say("No valid code proposal").await;
            return Tick::NoProposal;
        };

        self.plan.set(files);
        self.say("I have a plan ready. Say approve or cancel.").await;
        let summary = self.plan.summary();
        self.show(&summary).await;
        Tick::PlanProposed
    }

    async fn approve_plan(&mut self) -> Tick {
        match writer::write_files(&self.output_dir, self.plan.files()).await {
            Ok(paths) => {
                self.plan.clear();
                self.say("Files created").await;
                Tick::PlanApproved(paths)
            }
            Err(e @ WriteError::UnsafePath(_)) => {
                tracing::warn!(error = %e, "plan rejected");
                self.plan.clear();
                self.say("Plan rejected: unsafe file name").await;
                Tick::PlanFailed
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write plan");
                self.say("Could not write files").await;
                Tick::PlanFailed
            }
        }
    }

    /// Mode named by a mode-switch phrase, if `normalized` is one.
    async fn mode_phrase(&self, normalized: &str) -> Option<Mode> {
        let intent = self.engine.parse_local(normalized).await?;
        if intent.intent_id != IntentId::ModeSwitch || intent.validate().is_err() {
            return None;
        }
        intent.param_str("mode")?.parse().ok()
    }

    async fn dispatch(&mut self, intent: &Intent) {
        if intent.intent_id == IntentId::ModeSwitch {
            match intent.param_str("mode").map(str::parse::<Mode>) {
                Some(Ok(mode)) => self.apply_mode(mode).await,
                _ => tracing::warn!(params = ?intent.params, "mode switch without a valid mode"),
            }
            return;
        }
        self.execute_and_speak(intent).await;
    }

    async fn apply_mode(&mut self, mode: Mode) {
        self.session.switch_mode(mode);
        self.say(&format!("{} mode", mode_label(mode))).await;
    }

    async fn execute_and_speak(&self, intent: &Intent) {
        if let Some(feedback) = self.executor.execute(intent).await
            && !feedback.trim().is_empty()
        {
            self.say(&feedback).await;
        }
    }

    async fn append_log(&self, entry: LogEntry) {
        if let Err(e) = self.log.append(&entry).await {
            tracing::warn!(error = %e, event_type = %entry.event_type, "failed to append event");
        }
    }

    async fn say(&self, message: &str) {
        let speaker = self.speaker.lock().await;
        match tokio::time::timeout(self.speak_timeout, speaker.speak(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "speak failed"),
            Err(_) => tracing::warn!(timeout = ?self.speak_timeout, "speak timed out"),
        }
    }

    async fn show(&self, text: &str) {
        let speaker = self.speaker.lock().await;
        match tokio::time::timeout(self.speak_timeout, speaker.show(text)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "show failed"),
            Err(_) => tracing::warn!(timeout = ?self.speak_timeout, "show timed out"),
        }
    }
}

fn slot_prompt(param: &str) -> &'static str {
    match param {
        "query" => "What should I search?",
        _ => "Could you say that again?",
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Command => "Command",
        Mode::Dictation => "Dictation",
        Mode::Navigation => "Navigation",
    }
}
