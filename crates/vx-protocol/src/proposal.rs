//! AI proposal schema shared by the text-rewrite and code-generation
//! fallbacks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of proposal the model claims to have produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalKind {
    ImproveText,
    CodeGeneration,
    Unknown,
}

/// A model proposal. Never applied automatically: callers inspect it and
/// either stage it for approval or discard it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(rename = "type")]
    pub kind: ProposalKind,
    pub confidence: f64,
    #[serde(default)]
    pub result: Map<String, Value>,
}

/// Ways a deserialized proposal can still violate the schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProposalSchemaError {
    #[error("confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
}

impl Proposal {
    pub fn validate(&self) -> Result<(), ProposalSchemaError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(ProposalSchemaError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }

    /// Rewritten text of an `IMPROVE_TEXT` proposal.
    pub fn improved_text(&self) -> Option<&str> {
        self.result.get("text").and_then(Value::as_str)
    }

    /// Proposed files of a `CODE_GENERATION` proposal.
    ///
    /// Entries whose content is not a string are dropped.
    pub fn files(&self) -> BTreeMap<String, String> {
        self.result
            .get("files")
            .and_then(Value::as_object)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|(name, content)| {
                        content.as_str().map(|c| (name.clone(), c.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
