//! Rule router — deterministic matching against stored rules and built-in
//! grammars.
//!
//! Priority, first hit wins:
//! 1. exact stored pattern
//! 2. fuzzy stored pattern (gestalt ratio ≥ 0.92)
//! 3. mode switch ("dictation mode", ...)
//! 4. bare search ("search", "search google", ...) with an empty query
//! 5. search with query ("search cats", "google rust")
//! 6. navigation ("scroll up", "go left", ...)
//!
//! Anything else is `None` so the caller can fall through to the AI tier.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value, json};
use vx_protocol::{Intent, IntentId, IntentSource, Mode, Rule};

use super::IntentEngine;
use crate::similarity;
use crate::store::RuleStore;

/// Minimum gestalt ratio for a fuzzy hit. Deliberately strict: a wrong
/// deterministic answer is worse than asking the model.
pub const FUZZY_THRESHOLD: f64 = 0.92;

/// Confidence for an exact hit on a rule that stores none.
pub const EXACT_DEFAULT_CONFIDENCE: f64 = 0.95;

/// Confidence for a fuzzy hit on a rule that stores none.
pub const FUZZY_DEFAULT_CONFIDENCE: f64 = 0.9;

const GRAMMAR_CONFIDENCE: f64 = 0.99;
const PARTIAL_SEARCH_CONFIDENCE: f64 = 0.9;

const MODE_PHRASES: &[(&str, Mode)] = &[
    ("command mode", Mode::Command),
    ("dictation mode", Mode::Dictation),
    ("navigation mode", Mode::Navigation),
];

const BARE_SEARCH: &[&str] = &["search", "search google", "search on google"];

const NAVIGATION: &[(&str, &str, u32)] = &[
    ("scroll up", "UP", 3),
    ("scroll down", "DOWN", 3),
    ("go left", "LEFT", 1),
    ("go right", "RIGHT", 1),
];

static SEARCH_WITH_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:search for|search|google)\s+(.+)$").expect("search regex is valid")
});

/// Rule-first router backed by a [`RuleStore`].
pub struct RuleRouter {
    store: Arc<dyn RuleStore>,
}

impl RuleRouter {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Route normalized text. Rules are reloaded on every call so a rule
    /// committed by the learner is visible to the very next utterance.
    pub async fn route(&self, normalized: &str) -> Option<Intent> {
        let rules = self.store.load().await;
        let intent = match_rules(normalized, &rules);
        match &intent {
            Some(intent) => tracing::debug!(
                input = normalized,
                intent_id = %intent.intent_id,
                confidence = intent.confidence,
                "rule router matched"
            ),
            None => tracing::debug!(input = normalized, "rule router: no match"),
        }
        intent
    }
}

#[async_trait]
impl IntentEngine for RuleRouter {
    async fn parse(&self, text: &str) -> Option<Intent> {
        self.route(text).await
    }

    fn tier_name(&self) -> &str {
        "rules"
    }
}

/// Core matching logic over an already-loaded rule set.
pub fn match_rules(normalized: &str, rules: &[Rule]) -> Option<Intent> {
    let text = normalized.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if let Some(rule) = rules.iter().find(|r| r.pattern == text) {
        return Some(rule.to_intent(EXACT_DEFAULT_CONFIDENCE));
    }

    if let Some((rule, score)) = fuzzy_match(&text, rules) {
        tracing::debug!(input = %text, pattern = %rule.pattern, score, "fuzzy match");
        return Some(rule.to_intent(FUZZY_DEFAULT_CONFIDENCE));
    }

    builtin_grammar(&text)
}

/// Best-scoring rule at or above [`FUZZY_THRESHOLD`].
///
/// Ties keep the first rule to reach the maximum, in store order.
pub fn fuzzy_match<'a>(text: &str, rules: &'a [Rule]) -> Option<(&'a Rule, f64)> {
    let mut best: Option<(&Rule, f64)> = None;
    for rule in rules {
        let score = similarity::ratio(text, &rule.pattern);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((rule, score));
        }
    }
    best.filter(|(_, score)| *score >= FUZZY_THRESHOLD)
}

/// Hardcoded grammars: mode switch, search, navigation.
fn builtin_grammar(text: &str) -> Option<Intent> {
    if let Some((_, mode)) = MODE_PHRASES.iter().find(|(phrase, _)| *phrase == text) {
        return Some(grammar_intent(
            IntentId::ModeSwitch,
            json!({ "mode": mode.as_str() }),
            GRAMMAR_CONFIDENCE,
        ));
    }

    if BARE_SEARCH.contains(&text) {
        return Some(grammar_intent(
            IntentId::SearchWeb,
            json!({ "query": "" }),
            PARTIAL_SEARCH_CONFIDENCE,
        ));
    }

    if let Some(caps) = SEARCH_WITH_QUERY.captures(text) {
        let query = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        return Some(grammar_intent(
            IntentId::SearchWeb,
            json!({ "query": query }),
            GRAMMAR_CONFIDENCE,
        ));
    }

    if let Some((_, direction, count)) = NAVIGATION.iter().find(|(phrase, _, _)| *phrase == text) {
        return Some(grammar_intent(
            IntentId::Navigation,
            json!({ "direction": direction, "count": count }),
            GRAMMAR_CONFIDENCE,
        ));
    }

    None
}

fn grammar_intent(intent_id: IntentId, params: Value, confidence: f64) -> Intent {
    let params = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Intent::new(intent_id, params, confidence, IntentSource::Rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryRuleStore;

    fn rule(pattern: &str, id: &str, confidence: Option<f64>) -> Rule {
        Rule::new(pattern, id, Map::new(), confidence)
    }

    fn route(text: &str) -> Option<Intent> {
        match_rules(text, &[])
    }

    // ── Stored rules ────────────────────────────────────────────

    #[test]
    fn exact_match_wins_over_fuzzy_neighbours() {
        let rules = vec![
            rule("open browsers", "OPEN_WEBSITE", Some(0.99)),
            rule("open browser", "OPEN_APP", Some(0.8)),
        ];
        let intent = match_rules("open browser", &rules).unwrap();
        assert_eq!(intent.intent_id, IntentId::OpenApp);
        assert_eq!(intent.source, IntentSource::Rules);
        assert!((intent.confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_match_defaults_confidence() {
        let rules = vec![rule("open browser", "OPEN_APP", None)];
        let intent = match_rules("open browser", &rules).unwrap();
        assert!((intent.confidence - EXACT_DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn fuzzy_match_above_threshold() {
        // 22/23 ≈ 0.957
        let rules = vec![rule("open browser", "OPEN_APP", None)];
        let intent = match_rules("open browsr", &rules).unwrap();
        assert_eq!(intent.intent_id, IntentId::OpenApp);
        assert!((intent.confidence - FUZZY_DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn fuzzy_below_threshold_is_none() {
        // "open browser" vs "open bowl": well under 0.92
        let rules = vec![rule("open browser", "OPEN_APP", None)];
        assert!(match_rules("open bowl", &rules).is_none());
    }

    #[test]
    fn fuzzy_tie_keeps_first_rule() {
        let rules = vec![
            rule("open browserx", "FIRST", None),
            rule("open browsery", "SECOND", None),
        ];
        let (best, _) = fuzzy_match("open browser", &rules).unwrap();
        assert_eq!(best.intent_id, IntentId::Other("FIRST".into()));
    }

    #[test]
    fn stored_rule_shadows_builtin_grammar() {
        let rules = vec![rule("scroll up", "PAGE_UP", Some(0.97))];
        let intent = match_rules("scroll up", &rules).unwrap();
        assert_eq!(intent.intent_id, IntentId::Other("PAGE_UP".into()));
    }

    // ── Built-in grammars ───────────────────────────────────────

    #[test]
    fn mode_switch() {
        let intent = route("dictation mode").unwrap();
        assert_eq!(intent.intent_id, IntentId::ModeSwitch);
        assert_eq!(intent.params["mode"], "DICTATION");
        assert!((intent.confidence - 0.99).abs() < f64::EPSILON);
    }

    #[test]
    fn bare_search_has_empty_query() {
        for text in ["search", "search google", "search on google"] {
            let intent = route(text).unwrap();
            assert_eq!(intent.intent_id, IntentId::SearchWeb);
            assert_eq!(intent.params["query"], "");
            assert!((intent.confidence - 0.9).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn search_with_query() {
        let intent = route("search rust async traits").unwrap();
        assert_eq!(intent.params["query"], "rust async traits");
        assert!((intent.confidence - 0.99).abs() < f64::EPSILON);

        assert_eq!(route("google weather").unwrap().params["query"], "weather");
        assert_eq!(route("search for cats").unwrap().params["query"], "cats");
    }

    #[test]
    fn navigation_table() {
        let intent = route("scroll down").unwrap();
        assert_eq!(intent.intent_id, IntentId::Navigation);
        assert_eq!(intent.params["direction"], "DOWN");
        assert_eq!(intent.params["count"], 3);

        let intent = route("go left").unwrap();
        assert_eq!(intent.params["direction"], "LEFT");
        assert_eq!(intent.params["count"], 1);
    }

    #[test]
    fn unrecognized_returns_none() {
        assert!(route("hello world").is_none());
        assert!(route("make me a sandwich").is_none());
        assert!(route("").is_none());
        assert!(route("   ").is_none());
    }

    #[test]
    fn input_is_lowercased_before_matching() {
        assert!(route("Scroll Up").is_some());
    }

    // ── Store reload ────────────────────────────────────────────

    #[tokio::test]
    async fn router_sees_rules_saved_between_calls() {
        let store = Arc::new(MemoryRuleStore::new());
        let router = RuleRouter::new(store.clone());
        assert!(router.route("turn on lights").await.is_none());

        store
            .save(&[rule("turn on lights", "LIGHTS_ON", Some(0.95))])
            .await
            .unwrap();
        let intent = router.route("turn on lights").await.unwrap();
        assert_eq!(intent.intent_id, IntentId::Other("LIGHTS_ON".into()));
        assert_eq!(router.tier_name(), "rules");
    }
}
