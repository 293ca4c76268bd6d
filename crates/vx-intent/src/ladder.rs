//! Confidence ladder — per-source minimum confidence before execution.

use std::collections::HashMap;

use serde::Deserialize;
use vx_protocol::{Intent, IntentSource};

/// Threshold for sources missing from the ladder. Above any valid
/// confidence, so unlisted sources are always rejected.
pub const FAIL_CLOSED_THRESHOLD: f64 = 1.1;

/// Outcome of passing an intent through the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accepted,
    Rejected { threshold: f64 },
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted)
    }
}

/// Per-source acceptance thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfidenceLadder {
    #[serde(default)]
    pub min_confidence: HashMap<IntentSource, f64>,
}

impl Default for ConfidenceLadder {
    fn default() -> Self {
        Self {
            min_confidence: HashMap::from([
                (IntentSource::Rules, 0.8),
                (IntentSource::State, 0.9),
                (IntentSource::Ai, 0.6),
            ]),
        }
    }
}

impl ConfidenceLadder {
    /// A ladder with no entries: every intent is rejected.
    pub fn empty() -> Self {
        Self {
            min_confidence: HashMap::new(),
        }
    }

    pub fn with_threshold(mut self, source: IntentSource, min: f64) -> Self {
        self.min_confidence.insert(source, min);
        self
    }

    /// Minimum confidence for `source`.
    pub fn threshold(&self, source: IntentSource) -> f64 {
        self.min_confidence
            .get(&source)
            .copied()
            .unwrap_or(FAIL_CLOSED_THRESHOLD)
    }

    pub fn accepts(&self, intent: &Intent) -> bool {
        self.evaluate(intent).is_accepted()
    }

    pub fn evaluate(&self, intent: &Intent) -> GateDecision {
        let threshold = self.threshold(intent.source);
        if intent.confidence >= threshold {
            GateDecision::Accepted
        } else {
            GateDecision::Rejected { threshold }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn intent(source: IntentSource, confidence: f64) -> Intent {
        Intent::new("OPEN_APP", Map::new(), confidence, source)
    }

    #[test]
    fn accepts_at_or_above_threshold() {
        let ladder = ConfidenceLadder::empty().with_threshold(IntentSource::Rules, 0.8);
        assert!(ladder.accepts(&intent(IntentSource::Rules, 0.8)));
        assert!(ladder.accepts(&intent(IntentSource::Rules, 0.95)));
        assert_eq!(
            ladder.evaluate(&intent(IntentSource::Rules, 0.79)),
            GateDecision::Rejected { threshold: 0.8 }
        );
    }

    #[test]
    fn unlisted_source_fails_closed_for_every_valid_confidence() {
        let ladder = ConfidenceLadder::empty().with_threshold(IntentSource::Rules, 0.0);
        for step in 0..=100 {
            let confidence = step as f64 / 100.0;
            assert!(!ladder.accepts(&intent(IntentSource::Ai, confidence)));
            assert!(!ladder.accepts(&intent(IntentSource::State, confidence)));
        }
    }

    #[test]
    fn default_ladder_rejects_canonical_unknown() {
        assert!(!ConfidenceLadder::default().accepts(&Intent::unknown()));
    }

    #[test]
    fn deserialize_from_toml() {
        let ladder: ConfidenceLadder = toml::from_str(
            r#"
[min_confidence]
RULES = 0.85
AI = 0.7
"#,
        )
        .unwrap();
        assert_eq!(ladder.threshold(IntentSource::Rules), 0.85);
        assert_eq!(ladder.threshold(IntentSource::Ai), 0.7);
        assert_eq!(ladder.threshold(IntentSource::State), FAIL_CLOSED_THRESHOLD);
    }
}
