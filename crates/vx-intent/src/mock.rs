//! In-memory rule store and event log for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vx_protocol::{LogEntry, Rule};

use crate::error::{StoreError, StoreResult};
use crate::event_log::EventLog;
use crate::store::RuleStore;

/// A rule store that keeps rules in memory and counts saves.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: Mutex<Vec<Rule>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            ..Self::default()
        }
    }

    /// A store whose every save fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    /// Snapshot of the current rules.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn load(&self) -> Vec<Rule> {
        self.rules()
    }

    async fn save(&self, rules: &[Rule]) -> StoreResult<()> {
        if self.fail_saves {
            return Err(StoreError::Io("simulated write failure".into()));
        }
        let mut guard = self
            .rules
            .lock()
            .map_err(|_| StoreError::Other("rule store lock poisoned".into()))?;
        *guard = rules.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An event log that keeps entries in memory.
#[derive(Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Snapshot of the recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, entry: &LogEntry) -> StoreResult<()> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Other("event log lock poisoned".into()))?
            .push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> StoreResult<Vec<LogEntry>> {
        Ok(self.entries())
    }
}
