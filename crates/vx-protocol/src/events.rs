//! Append-only event log records.
//!
//! One `INTENT_PARSED` entry is written per resolved utterance; the log miner
//! reads them back in bulk at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::{Intent, IntentSource};

/// Event type for a resolved utterance.
pub const INTENT_PARSED: &str = "INTENT_PARSED";
/// Event type for an intent that fell below its confidence threshold.
pub const INTENT_REJECTED: &str = "INTENT_REJECTED";

/// A single line of the event log.
///
/// `payload` stays untyped on read so entries written by older builds (or by
/// hand) never fail to load; typed views are extracted on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Value,
}

/// Payload of an `INTENT_PARSED` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentParsed {
    pub text: String,
    pub intent_id: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<IntentSource>,
}

impl LogEntry {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Some(Utc::now()),
            payload,
        }
    }

    /// Record the intent resolved for `text`.
    pub fn intent_parsed(text: &str, intent: &Intent) -> Self {
        Self::new(INTENT_PARSED, payload_for(text, intent))
    }

    /// Record an intent the confidence ladder refused.
    pub fn intent_rejected(text: &str, intent: &Intent, threshold: f64) -> Self {
        let mut payload = payload_for(text, intent);
        if let Value::Object(map) = &mut payload {
            map.insert("threshold".into(), Value::from(threshold));
        }
        Self::new(INTENT_REJECTED, payload)
    }

    /// Typed view of an `INTENT_PARSED` payload.
    ///
    /// Returns `None` for other event types or when `text`/`intent_id` are
    /// missing. A non-numeric confidence reads as 0.0.
    pub fn as_intent_parsed(&self) -> Option<IntentParsed> {
        if self.event_type != INTENT_PARSED {
            return None;
        }
        let map = self.payload.as_object()?;
        let text = map.get("text")?.as_str()?.to_string();
        let intent_id = map.get("intent_id")?.as_str()?.to_string();
        let params = map
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let confidence = map.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
        let source = map
            .get("source")
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Some(IntentParsed {
            text,
            intent_id,
            params,
            confidence,
            source,
        })
    }
}

fn payload_for(text: &str, intent: &Intent) -> Value {
    serde_json::to_value(IntentParsed {
        text: text.to_string(),
        intent_id: intent.intent_id.to_string(),
        params: intent.params.clone(),
        confidence: intent.confidence,
        source: Some(intent.source),
    })
    .unwrap_or(Value::Null)
}
