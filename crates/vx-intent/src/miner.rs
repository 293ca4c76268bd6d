//! Log miner — promotes repeatedly-failed-then-resolved utterances to rules.
//!
//! Runs once at startup. An utterance that came back `UNKNOWN` at least
//! `min_failures` times and was later resolved with high confidence gets its
//! last confident resolution written as a rule, so the next time it is heard
//! the rule router answers without asking the model.

use std::collections::{HashMap, HashSet};

use vx_protocol::{IntentId, IntentParsed, LogEntry, Rule, canonical_pattern};

use crate::error::StoreResult;
use crate::event_log::EventLog;
use crate::store::RuleStore;

pub const MIN_FAILURES: usize = 3;
pub const MIN_SUCCESS_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogMiner {
    pub min_failures: usize,
    pub min_success_confidence: f64,
}

impl Default for LogMiner {
    fn default() -> Self {
        Self {
            min_failures: MIN_FAILURES,
            min_success_confidence: MIN_SUCCESS_CONFIDENCE,
        }
    }
}

impl LogMiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules to promote from `entries`, in first-seen order of their text.
    ///
    /// Never returns a rule whose pattern is already in `existing` or was
    /// promoted earlier in the same pass.
    pub fn mine(&self, entries: &[LogEntry], existing: &[Rule]) -> Vec<Rule> {
        let mut failures: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut successes: HashMap<String, IntentParsed> = HashMap::new();

        for parsed in entries.iter().filter_map(LogEntry::as_intent_parsed) {
            if parsed.text.is_empty() {
                continue;
            }
            if parsed.intent_id == IntentId::Unknown.as_str() {
                *failures.entry(parsed.text).or_default() += 1;
            } else if parsed.confidence >= self.min_success_confidence
                && parsed.confidence <= 1.0
                && !parsed.intent_id.trim().is_empty()
            {
                if !successes.contains_key(&parsed.text) {
                    order.push(parsed.text.clone());
                }
                // later entries for the same text win
                successes.insert(parsed.text.clone(), parsed);
            }
        }

        let mut known: HashSet<String> = existing.iter().map(|r| r.pattern.clone()).collect();
        let mut promoted = Vec::new();

        for text in order {
            let count = failures.get(&text).copied().unwrap_or_default();
            if count < self.min_failures {
                continue;
            }
            let pattern = canonical_pattern(&text);
            if known.contains(&text) || known.contains(&pattern) {
                continue;
            }
            let Some(success) = successes.remove(&text) else {
                continue;
            };

            let rule = Rule::new(
                &pattern,
                success.intent_id,
                success.params,
                Some(success.confidence),
            );
            tracing::info!(
                pattern = %rule.pattern,
                intent_id = %rule.intent_id,
                failures = count,
                "promoting mined rule"
            );
            known.insert(pattern);
            promoted.push(rule);
        }

        promoted
    }

    /// Read `log`, promote qualifying utterances, and persist the rule store
    /// once if anything was promoted. Returns the number of new rules.
    pub async fn run(&self, log: &dyn EventLog, store: &dyn RuleStore) -> StoreResult<usize> {
        let entries = log.read_all().await?;
        if entries.is_empty() {
            return Ok(0);
        }

        let mut rules = store.load().await;
        let promoted = self.mine(&entries, &rules);
        let count = promoted.len();
        if count > 0 {
            rules.extend(promoted);
            store.save(&rules).await?;
        }

        tracing::info!(entries = entries.len(), promoted = count, "log mining complete");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MemoryEventLog, MemoryRuleStore};
    use serde_json::{Map, json};
    use vx_protocol::{INTENT_REJECTED, Intent, IntentSource};

    fn failure(text: &str) -> LogEntry {
        LogEntry::intent_parsed(text, &Intent::unknown())
    }

    fn success(text: &str, id: &str, confidence: f64) -> LogEntry {
        let mut params = Map::new();
        params.insert("app".into(), json!("lights"));
        LogEntry::intent_parsed(text, &Intent::new(id, params, confidence, IntentSource::Ai))
    }

    fn lights_log(failures: usize) -> Vec<LogEntry> {
        let mut entries: Vec<LogEntry> = (0..failures).map(|_| failure("turn on lights")).collect();
        entries.push(success("turn on lights", "OPEN_APP", 0.95));
        entries
    }

    #[test]
    fn promotes_after_three_failures() {
        let rules = LogMiner::new().mine(&lights_log(3), &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "turn on lights");
        assert_eq!(rules[0].intent_id, IntentId::OpenApp);
        assert_eq!(rules[0].confidence, Some(0.95));
        assert_eq!(rules[0].params["app"], "lights");
    }

    #[test]
    fn two_failures_are_not_enough() {
        assert!(LogMiner::new().mine(&lights_log(2), &[]).is_empty());
    }

    #[test]
    fn low_confidence_success_is_not_a_candidate() {
        let mut entries: Vec<LogEntry> = (0..3).map(|_| failure("turn on lights")).collect();
        entries.push(success("turn on lights", "OPEN_APP", 0.85));
        assert!(LogMiner::new().mine(&entries, &[]).is_empty());
    }

    #[test]
    fn last_success_wins() {
        let mut entries = lights_log(3);
        entries.push(success("turn on lights", "LIGHTS_ON", 0.92));
        let rules = LogMiner::new().mine(&entries, &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].intent_id, IntentId::Other("LIGHTS_ON".into()));
        assert_eq!(rules[0].confidence, Some(0.92));
    }

    #[test]
    fn out_of_range_success_is_not_a_candidate() {
        let mut entries: Vec<LogEntry> = (0..3).map(|_| failure("turn on lights")).collect();
        entries.push(success("turn on lights", "OPEN_APP", 7.0));
        entries.push(success("turn on lights", "", 0.95));
        assert!(LogMiner::new().mine(&entries, &[]).is_empty());

        // an earlier valid success is not overwritten by a bad one
        let mut entries = lights_log(3);
        entries.push(success("turn on lights", "LIGHTS_ON", 3.5));
        let rules = LogMiner::new().mine(&entries, &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].intent_id, IntentId::OpenApp);
        assert!(rules[0].validate().is_ok());
    }

    #[test]
    fn existing_pattern_blocks_promotion() {
        let existing = vec![Rule::new("turn on lights", "OPEN_APP", Map::new(), None)];
        assert!(LogMiner::new().mine(&lights_log(3), &existing).is_empty());
    }

    #[test]
    fn case_variants_promote_once() {
        let mut entries = Vec::new();
        for text in ["Turn On Lights", "turn on lights"] {
            entries.extend((0..3).map(|_| failure(text)));
            entries.push(success(text, "OPEN_APP", 0.95));
        }
        let rules = LogMiner::new().mine(&entries, &[]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "turn on lights");
    }

    #[test]
    fn promotions_keep_first_seen_order() {
        let mut entries = Vec::new();
        entries.push(success("dim lights", "DIM", 0.95));
        entries.extend(lights_log(3));
        entries.extend((0..3).map(|_| failure("dim lights")));
        let rules = LogMiner::new().mine(&entries, &[]);
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["dim lights", "turn on lights"]);
    }

    #[test]
    fn other_event_types_are_ignored() {
        let mut entries: Vec<LogEntry> = (0..3)
            .map(|_| {
                let mut e = failure("turn on lights");
                e.event_type = INTENT_REJECTED.into();
                e
            })
            .collect();
        entries.push(success("turn on lights", "OPEN_APP", 0.95));
        assert!(LogMiner::new().mine(&entries, &[]).is_empty());
    }

    #[tokio::test]
    async fn run_persists_once() {
        let log = MemoryEventLog::with_entries(lights_log(3));
        let store = MemoryRuleStore::with_rules(vec![Rule::new(
            "open browser",
            "OPEN_APP",
            Map::new(),
            None,
        )]);

        let count = LogMiner::new().run(&log, &store).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.rules().len(), 2);

        // Second pass finds nothing new and does not write.
        let count = LogMiner::new().run(&log, &store).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn run_on_empty_log_is_noop() {
        let store = MemoryRuleStore::new();
        let count = LogMiner::new()
            .run(&MemoryEventLog::new(), &store)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.save_count(), 0);
    }
}
