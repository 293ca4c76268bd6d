//! Rule store abstraction — load and persist the pattern → intent rules.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use vx_protocol::Rule;

use crate::error::StoreResult;

/// Durable storage for the rule set.
///
/// The router reloads on every call and the learner writes the whole set
/// back, so implementations only need whole-set read and replace.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Load every well-formed rule, in stored order.
    ///
    /// Missing, unreadable or malformed storage reads as an empty set.
    async fn load(&self) -> Vec<Rule>;

    /// Replace the stored rule set.
    async fn save(&self, rules: &[Rule]) -> StoreResult<()>;
}

/// Rules kept as a pretty-printed JSON array on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn load(&self) -> Vec<Rule> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_rules(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read rule store");
                Vec::new()
            }
        }
    }

    async fn save(&self, rules: &[Rule]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(rules)?;

        // Write a sibling then rename so readers never see a torn file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), count = rules.len(), "rule store saved");
        Ok(())
    }
}

/// Parse a rule store document.
///
/// Anything other than a JSON array yields no rules; array elements that do
/// not fit the rule schema, or carry an out-of-range confidence or an empty
/// intent id, are skipped individually.
pub fn parse_rules(content: &str) -> Vec<Rule> {
    let value: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "rule store is not valid JSON");
            return Vec::new();
        }
    };

    let Value::Array(items) = value else {
        tracing::warn!("rule store is not a JSON array");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Rule>(item) {
            Ok(rule) => match rule.validate() {
                Ok(()) => Some(rule),
                Err(e) => {
                    tracing::debug!(error = %e, pattern = %rule.pattern, "skipping invalid rule");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed rule");
                None
            }
        })
        .collect()
}
