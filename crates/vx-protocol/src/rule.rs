use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::{Intent, IntentError, IntentId, IntentSource};

/// A persisted pattern → intent association used by the rule router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Normalized, lower-cased utterance. Unique within a rule store.
    pub pattern: String,
    pub intent_id: IntentId,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Stored confidence. Absent on hand-written rules; the router applies
    /// its own default in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Rule {
    pub fn new(
        pattern: impl AsRef<str>,
        intent_id: impl Into<IntentId>,
        params: Map<String, Value>,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            pattern: canonical_pattern(pattern.as_ref()),
            intent_id: intent_id.into(),
            params,
            confidence,
        }
    }

    /// Build a rule that replays `intent` whenever `pattern` is heard.
    pub fn from_intent(pattern: impl AsRef<str>, intent: &Intent) -> Self {
        Self::new(
            pattern,
            intent.intent_id.clone(),
            intent.params.clone(),
            Some(intent.confidence),
        )
    }

    /// Stored confidence, when present, must be in [0.0, 1.0] and the
    /// intent id non-empty.
    pub fn validate(&self) -> Result<(), IntentError> {
        if let Some(confidence) = self.confidence
            && (!confidence.is_finite() || !(0.0..=1.0).contains(&confidence))
        {
            return Err(IntentError::ConfidenceOutOfRange(confidence));
        }
        if self.intent_id.as_str().trim().is_empty() {
            return Err(IntentError::EmptyIntentId);
        }
        Ok(())
    }

    /// Materialize this rule as a rule-sourced intent.
    pub fn to_intent(&self, default_confidence: f64) -> Intent {
        Intent::new(
            self.intent_id.clone(),
            self.params.clone(),
            self.confidence.unwrap_or(default_confidence),
            IntentSource::Rules,
        )
    }
}

/// Patterns are stored lower-cased and trimmed.
pub fn canonical_pattern(text: &str) -> String {
    text.trim().to_lowercase()
}
