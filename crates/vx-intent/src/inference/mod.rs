//! Utterance → intent classification.
//!
//! Two tiers:
//! - **Rules** (local): stored patterns (exact, then fuzzy) and a handful of
//!   built-in grammars. Never guesses; a miss is `None`.
//! - **AI** (remote): a hosted text model asked for JSON, canonicalized into
//!   the same intent schema. Never misses; failures become `UNKNOWN`.

pub mod ai;
pub mod rules;
pub mod tiered;

use async_trait::async_trait;
use vx_protocol::Intent;

/// Trait for engines that classify normalized text into an intent.
#[async_trait]
pub trait IntentEngine: Send + Sync {
    /// Classify `text`. Returns None if the engine has no answer.
    async fn parse(&self, text: &str) -> Option<Intent>;

    /// Name of this tier (for logging/audit).
    fn tier_name(&self) -> &str;
}

pub use ai::{AiRouter, AiRouterConfig};
pub use rules::RuleRouter;
pub use tiered::TieredEngine;
