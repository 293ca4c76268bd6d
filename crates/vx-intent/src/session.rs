//! Session state — interaction mode plus the single pending slot.
//!
//! The slot sub-state is a two-state machine: idle, or awaiting one named
//! parameter for one intent. Requesting a slot while another is pending
//! replaces it. Completing it always returns to idle.

use serde_json::{Map, Value};
use vx_protocol::{Intent, IntentId, IntentSource, Mode};

/// Confidence of an intent completed from a follow-up utterance.
pub const SLOT_COMPLETION_CONFIDENCE: f64 = 0.99;

/// A parameter the session is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSlot {
    pub param: String,
    pub intent_id: IntentId,
}

/// Process-lifetime interaction state, owned by the assistant loop.
#[derive(Debug, Clone, Default)]
pub struct Session {
    mode: Mode,
    awaiting: Option<PendingSlot>,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            awaiting: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode, returning the previous one.
    pub fn switch_mode(&mut self, mode: Mode) -> Mode {
        let previous = std::mem::replace(&mut self.mode, mode);
        if previous != mode {
            tracing::info!(from = %previous, to = %mode, "mode switched");
        }
        previous
    }

    pub fn awaiting_param(&self) -> Option<&str> {
        self.awaiting.as_ref().map(|s| s.param.as_str())
    }

    pub fn last_intent(&self) -> Option<&IntentId> {
        self.awaiting.as_ref().map(|s| &s.intent_id)
    }

    pub fn pending(&self) -> Option<&PendingSlot> {
        self.awaiting.as_ref()
    }

    /// Wait for `param` of `intent_id` on the next utterance.
    pub fn request_slot(&mut self, param: impl Into<String>, intent_id: IntentId) {
        let slot = PendingSlot {
            param: param.into(),
            intent_id,
        };
        if let Some(previous) = self.awaiting.replace(slot) {
            tracing::debug!(param = %previous.param, "pending slot replaced");
        }
    }

    pub fn clear_awaiting(&mut self) {
        self.awaiting = None;
    }

    /// Fill the pending slot with the whole of `text`.
    ///
    /// Returns the completed state-sourced intent, or `None` when no slot is
    /// pending. The slot is cleared either way.
    pub fn complete_slot(&mut self, text: &str) -> Option<Intent> {
        let slot = self.awaiting.take()?;
        let mut params = Map::new();
        params.insert(slot.param, Value::String(text.to_string()));
        Some(Intent::new(
            slot.intent_id,
            params,
            SLOT_COMPLETION_CONFIDENCE,
            IntentSource::State,
        ))
    }
}

/// Name of the slot `intent` still needs, if it is incomplete.
pub fn missing_slot(intent: &Intent) -> Option<&'static str> {
    match intent.intent_id {
        IntentId::SearchWeb => {
            let query = intent.param_str("query").unwrap_or_default();
            query.trim().is_empty().then_some("query")
        }
        _ => None,
    }
}
