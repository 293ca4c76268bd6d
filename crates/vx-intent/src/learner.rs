//! Learner — grows the rule store from confirmed intents.
//!
//! Only `RULES` and `STATE` intents are eligible; model output never becomes
//! a deterministic rule without going through the log miner. Every write is
//! gated by a [`LearnPolicy`] and by global pattern uniqueness.

use std::sync::Arc;

use vx_protocol::{Intent, IntentSource, Rule, canonical_pattern};

use crate::error::StoreResult;
use crate::store::RuleStore;

/// Moderation predicate consulted before a rule is written.
pub trait LearnPolicy: Send + Sync {
    fn allows(&self, intent: &Intent, text: &str) -> bool;
}

/// Refuses empty utterances, `UNKNOWN` intents, and intents carrying an
/// empty string parameter (an unfilled slot).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLearnPolicy;

impl LearnPolicy for DefaultLearnPolicy {
    fn allows(&self, intent: &Intent, text: &str) -> bool {
        if text.trim().is_empty() || intent.intent_id.is_unknown() {
            return false;
        }
        !intent
            .params
            .values()
            .any(|v| v.as_str().is_some_and(|s| s.trim().is_empty()))
    }
}

/// What a call to [`Learner::learn`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnOutcome {
    Learned(Rule),
    /// The pattern is already in the store.
    Duplicate,
    /// Vetoed by the policy.
    Rejected,
    /// AI-sourced intents are never learned directly.
    IgnoredSource,
}

pub struct Learner {
    store: Arc<dyn RuleStore>,
    policy: Box<dyn LearnPolicy>,
}

impl Learner {
    pub fn new(store: Arc<dyn RuleStore>, policy: Box<dyn LearnPolicy>) -> Self {
        Self { store, policy }
    }

    pub fn with_default_policy(store: Arc<dyn RuleStore>) -> Self {
        Self::new(store, Box::new(DefaultLearnPolicy))
    }

    /// Persist `intent` as a rule for `text` if it is eligible and new.
    pub async fn learn(&self, intent: &Intent, text: &str) -> StoreResult<LearnOutcome> {
        if intent.source == IntentSource::Ai {
            tracing::debug!(intent_id = %intent.intent_id, "not learning AI-sourced intent");
            return Ok(LearnOutcome::IgnoredSource);
        }

        if !self.policy.allows(intent, text) {
            tracing::info!(input = text, intent_id = %intent.intent_id, "learning rejected by policy");
            return Ok(LearnOutcome::Rejected);
        }

        let mut rules = self.store.load().await;
        let pattern = canonical_pattern(text);
        if rules.iter().any(|r| r.pattern == pattern) {
            tracing::debug!(%pattern, "rule already exists");
            return Ok(LearnOutcome::Duplicate);
        }

        let rule = Rule::from_intent(&pattern, intent);
        rules.push(rule.clone());
        self.store.save(&rules).await?;

        tracing::info!(
            pattern = %rule.pattern,
            intent_id = %rule.intent_id,
            confidence = intent.confidence,
            "rule learned"
        );
        Ok(LearnOutcome::Learned(rule))
    }
}
