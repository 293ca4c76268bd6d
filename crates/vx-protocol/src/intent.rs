use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confidence assigned to AI-produced intents when the model omits one,
/// and to the canonical `UNKNOWN` fallback.
pub const DEFAULT_AI_CONFIDENCE: f64 = 0.4;

/// Canonical intent tag.
///
/// Serialized as the bare upper-case string (`"SEARCH_WEB"`). Tags outside
/// the built-in set round-trip through `Other` so learned rules and model
/// output can introduce new actions without a schema change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentId {
    OpenWebsite,
    OpenApp,
    SearchWeb,
    ModeSwitch,
    Navigation,
    Unknown,
    Other(String),
}

impl IntentId {
    pub fn as_str(&self) -> &str {
        match self {
            IntentId::OpenWebsite => "OPEN_WEBSITE",
            IntentId::OpenApp => "OPEN_APP",
            IntentId::SearchWeb => "SEARCH_WEB",
            IntentId::ModeSwitch => "MODE_SWITCH",
            IntentId::Navigation => "NAVIGATION",
            IntentId::Unknown => "UNKNOWN",
            IntentId::Other(s) => s,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, IntentId::Unknown)
    }
}

impl From<String> for IntentId {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OPEN_WEBSITE" => IntentId::OpenWebsite,
            "OPEN_APP" => IntentId::OpenApp,
            "SEARCH_WEB" => IntentId::SearchWeb,
            "MODE_SWITCH" => IntentId::ModeSwitch,
            "NAVIGATION" => IntentId::Navigation,
            "UNKNOWN" => IntentId::Unknown,
            _ => IntentId::Other(s),
        }
    }
}

impl From<&str> for IntentId {
    fn from(s: &str) -> Self {
        IntentId::from(s.to_string())
    }
}

impl From<IntentId> for String {
    fn from(id: IntentId) -> Self {
        match id {
            IntentId::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pipeline stage produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentSource {
    /// Deterministic rule router (stored rules or built-in grammars).
    Rules,
    /// Remote model fallback.
    Ai,
    /// Multi-turn slot completion.
    State,
}

impl IntentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentSource::Rules => "RULES",
            IntentSource::Ai => "AI",
            IntentSource::State => "STATE",
        }
    }
}

impl fmt::Display for IntentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interaction mode of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Command,
    Dictation,
    Navigation,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Command => "COMMAND",
            Mode::Dictation => "DICTATION",
            Mode::Navigation => "NAVIGATION",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMMAND" => Ok(Mode::Command),
            "DICTATION" => Ok(Mode::Dictation),
            "NAVIGATION" => Ok(Mode::Navigation),
            other => Err(IntentError::UnknownMode(other.to_string())),
        }
    }
}

/// Schema violations detected on an intent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    #[error("confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),

    #[error("intent_id is empty")]
    EmptyIntentId,

    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

/// Canonical structured action request derived from an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_id: IntentId,
    /// Slot values; semantics depend on `intent_id`.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f64,
    pub source: IntentSource,
}

impl Intent {
    pub fn new(
        intent_id: impl Into<IntentId>,
        params: Map<String, Value>,
        confidence: f64,
        source: IntentSource,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            params,
            confidence,
            source,
        }
    }

    /// The canonical "could not classify" intent.
    pub fn unknown() -> Self {
        Self::new(
            IntentId::Unknown,
            Map::new(),
            DEFAULT_AI_CONFIDENCE,
            IntentSource::Ai,
        )
    }

    /// String value of a slot, if present and a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Check the schema invariants every executable intent must satisfy.
    pub fn validate(&self) -> Result<(), IntentError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(IntentError::ConfidenceOutOfRange(self.confidence));
        }
        if self.intent_id.as_str().trim().is_empty() {
            return Err(IntentError::EmptyIntentId);
        }
        Ok(())
    }
}
