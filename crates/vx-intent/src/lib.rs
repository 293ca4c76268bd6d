//! Intent resolution pipeline for the Voxa assistant.
//!
//! Turns normalized utterances into canonical [`Intent`] records:
//! deterministic rules first (exact, fuzzy, built-in grammars), a remote
//! model as fallback, a per-source confidence ladder in front of execution,
//! single-slot multi-turn completion, and a learning loop that grows the
//! rule store from confirmed intents and mined logs.
//!
//! [`Intent`]: vx_protocol::Intent

pub mod error;
pub mod event_log;
pub mod inference;
pub mod ladder;
pub mod learner;
pub mod miner;
pub mod mock;
pub mod normalizer;
pub mod session;
pub mod similarity;
pub mod store;

// Re-export key types for convenience
pub use error::{StoreError, StoreResult};
pub use event_log::{EventLog, FileEventLog};
pub use inference::{AiRouter, AiRouterConfig, IntentEngine, RuleRouter, TieredEngine};
pub use ladder::ConfidenceLadder;
pub use learner::{DefaultLearnPolicy, LearnOutcome, LearnPolicy, Learner};
pub use miner::LogMiner;
pub use mock::{MemoryEventLog, MemoryRuleStore};
pub use normalizer::normalize;
pub use session::{PendingSlot, Session};
pub use store::{FileRuleStore, RuleStore};
