//! E2E tests for the learning loop: learner writes, router reads, miner
//! promotes across restarts.

mod helpers;

use serde_json::{Map, json};

use helpers::{TestHarness, mount_ai_reply};
use vx_assistant::assistant::Tick;
use vx_protocol::{Intent, IntentId, IntentSource, LogEntry};
use wiremock::MockServer;

fn lights_on() -> Intent {
    let mut params = Map::new();
    params.insert("app".into(), json!("lights"));
    Intent::new(IntentId::OpenApp, params, 0.95, IntentSource::Ai)
}

/// A confirmed rule intent is persisted once, however often it is heard.
#[tokio::test]
async fn e2e_learning_is_idempotent_on_disk() {
    let mut h = TestHarness::offline();
    h.say("google weather").await;
    h.say("Google weather!").await;

    let rules = h.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].pattern, "google weather");
    assert_eq!(rules[0].intent_id, IntentId::SearchWeb);
    assert_eq!(rules[0].params["query"], "weather");
}

/// A learned rule is served from the store on the next call, including
/// fuzzy variants of it.
#[tokio::test]
async fn e2e_learned_rule_serves_fuzzy_variant() {
    let mut h = TestHarness::offline();
    h.say("search rust async traits").await;

    // One dropped letter: above the 0.92 fuzzy threshold.
    let tick = h.say("search rust async trait").await;
    let Tick::Dispatched { intent, accepted } = tick else {
        panic!("expected dispatch, got {tick:?}");
    };
    assert!(accepted);
    assert_eq!(intent.source, IntentSource::Rules);
    assert_eq!(intent.params["query"], "rust async traits");
}

/// Three UNKNOWNs then a confident resolution are promoted at startup and
/// answered by the rule router afterwards, without the AI tier.
#[tokio::test]
async fn e2e_miner_promotes_across_restart() {
    let server = MockServer::start().await;
    let mut h = TestHarness::with_ai(&server);

    let mut history: Vec<LogEntry> = (0..3)
        .map(|_| LogEntry::intent_parsed("turn on lights", &Intent::unknown()))
        .collect();
    history.push(LogEntry::intent_parsed("turn on lights", &lights_on()));
    h.seed_log(&history);

    h.restart();
    assert_eq!(h.assistant.mine_logs().await.unwrap(), 1);

    let rules = h.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].pattern, "turn on lights");
    assert_eq!(rules[0].intent_id, IntentId::OpenApp);
    assert_eq!(rules[0].confidence, Some(0.95));

    let tick = h.say("Please turn on the lights").await;
    let Tick::Dispatched { intent, accepted } = tick else {
        panic!("expected dispatch, got {tick:?}");
    };
    assert!(accepted);
    assert_eq!(intent.source, IntentSource::Rules);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    // Mining again promotes nothing new.
    assert_eq!(h.assistant.mine_logs().await.unwrap(), 0);
    assert_eq!(h.rules().len(), 1);
}

/// Two failures are not enough evidence.
#[tokio::test]
async fn e2e_miner_needs_three_failures() {
    let mut h = TestHarness::offline();
    let mut history: Vec<LogEntry> = (0..2)
        .map(|_| LogEntry::intent_parsed("turn on lights", &Intent::unknown()))
        .collect();
    history.push(LogEntry::intent_parsed("turn on lights", &lights_on()));
    h.seed_log(&history);

    h.restart();
    assert_eq!(h.assistant.mine_logs().await.unwrap(), 0);
    assert!(h.rules().is_empty());
}

/// The loop's own log feeds the miner: repeated AI failures followed by a
/// confident AI answer become a rule on the next start.
#[tokio::test]
async fn e2e_live_log_feeds_miner() {
    let failing = MockServer::start().await;
    mount_ai_reply(&failing, "I am not sure what you mean.").await;
    let mut h = TestHarness::with_ai(&failing);
    for _ in 0..3 {
        let tick = h.say("dim the lights").await;
        assert!(matches!(tick, Tick::Dispatched { accepted: false, .. }));
    }

    let confident = MockServer::start().await;
    mount_ai_reply(
        &confident,
        r#"{"intent_id": "OPEN_APP", "params": {"app": "lights"}, "confidence": 0.93}"#,
    )
    .await;
    h.config.ai_router.endpoint = format!("{}{}", confident.uri(), helpers::AI_PATH);
    h.restart();
    let tick = h.say("dim the lights").await;
    assert!(matches!(tick, Tick::Dispatched { accepted: true, .. }));
    // AI answers are never learned directly.
    assert!(h.rules().is_empty());

    h.restart();
    assert_eq!(h.assistant.mine_logs().await.unwrap(), 1);
    assert_eq!(h.rules()[0].pattern, "dim lights");
}
