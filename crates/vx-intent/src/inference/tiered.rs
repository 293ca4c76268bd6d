//! Tiered engine — rules first, AI fallback.
//!
//! Tries the local (rule) engine first. If it returns `None`, falls back to
//! the cloud (AI) engine. A miss on both tiers is canonicalized to
//! `UNKNOWN` so callers always get an intent.

use async_trait::async_trait;
use vx_protocol::Intent;

use super::IntentEngine;

/// Composite engine that tries local rules first, then the remote model.
pub struct TieredEngine {
    local: Box<dyn IntentEngine>,
    cloud: Box<dyn IntentEngine>,
}

impl TieredEngine {
    pub fn new(local: Box<dyn IntentEngine>, cloud: Box<dyn IntentEngine>) -> Self {
        Self { local, cloud }
    }

    /// Local tier only. Used where the AI fallback must not run (navigation
    /// mode).
    pub async fn parse_local(&self, text: &str) -> Option<Intent> {
        self.local.parse(text).await
    }

    /// Resolve `text` through both tiers, never returning `None`.
    pub async fn resolve(&self, text: &str) -> Intent {
        self.parse(text).await.unwrap_or_else(Intent::unknown)
    }
}

#[async_trait]
impl IntentEngine for TieredEngine {
    async fn parse(&self, text: &str) -> Option<Intent> {
        // Try local first
        if let Some(intent) = self.local.parse(text).await {
            return Some(intent);
        }

        // Fall back to cloud
        tracing::debug!(
            local = self.local.tier_name(),
            cloud = self.cloud.tier_name(),
            "local tier missed, falling back"
        );
        self.cloud.parse(text).await
    }

    fn tier_name(&self) -> &str {
        "tiered"
    }
}
