//! Action executor — turns an accepted intent into user-facing feedback.
//!
//! Keyboard and OS automation are external. [`DescribingExecutor`] renders
//! what would be done for each known intent and performs nothing.

use async_trait::async_trait;
use vx_protocol::{Intent, IntentId};

/// Executes intents. Returns feedback to speak, if any.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, intent: &Intent) -> Option<String>;
}

/// Describes each intent instead of acting on it.
#[derive(Debug, Default)]
pub struct DescribingExecutor;

impl DescribingExecutor {
    pub fn describe(intent: &Intent) -> Option<String> {
        match &intent.intent_id {
            IntentId::OpenWebsite => {
                let target = intent
                    .param_str("url")
                    .or_else(|| intent.param_str("site"))
                    .filter(|s| !s.is_empty())?;
                Some(format!("Opening {target}"))
            }
            IntentId::OpenApp => {
                let app = intent
                    .param_str("app")
                    .or_else(|| intent.param_str("name"))
                    .filter(|s| !s.is_empty())?;
                Some(format!("Opening {app}"))
            }
            IntentId::SearchWeb => {
                let query = intent.param_str("query").filter(|q| !q.is_empty())?;
                Some(format!("Searching for {query}"))
            }
            IntentId::Navigation => {
                let direction = intent.param_str("direction")?.to_lowercase();
                let count = intent
                    .params
                    .get("count")
                    .and_then(|c| c.as_u64())
                    .unwrap_or(1);
                Some(format!("Scrolling {direction} {count}"))
            }
            IntentId::ModeSwitch => {
                let mode = intent.param_str("mode")?.to_lowercase();
                Some(format!("Switching to {mode} mode"))
            }
            IntentId::Unknown => Some("Sorry, I didn't understand that".into()),
            IntentId::Other(id) => {
                tracing::debug!(intent_id = %id, "no action for custom intent");
                None
            }
        }
    }
}

#[async_trait]
impl ActionExecutor for DescribingExecutor {
    async fn execute(&self, intent: &Intent) -> Option<String> {
        let feedback = Self::describe(intent);
        tracing::info!(
            intent_id = %intent.intent_id,
            source = %intent.source,
            confidence = intent.confidence,
            "executing intent"
        );
        feedback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};
    use vx_protocol::IntentSource;

    fn intent(id: &str, params: Value) -> Intent {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Intent::new(id, params, 0.95, IntentSource::Rules)
    }

    #[tokio::test]
    async fn describes_known_intents() {
        let exec = DescribingExecutor;
        assert_eq!(
            exec.execute(&intent("SEARCH_WEB", json!({"query": "cats"}))).await,
            Some("Searching for cats".into())
        );
        assert_eq!(
            exec.execute(&intent("OPEN_APP", json!({"app": "firefox"}))).await,
            Some("Opening firefox".into())
        );
        assert_eq!(
            exec.execute(&intent("NAVIGATION", json!({"direction": "UP", "count": 3})))
                .await,
            Some("Scrolling up 3".into())
        );
    }

    #[tokio::test]
    async fn incomplete_or_custom_intents_are_silent() {
        let exec = DescribingExecutor;
        assert!(exec.execute(&intent("SEARCH_WEB", json!({"query": ""}))).await.is_none());
        assert!(exec.execute(&intent("OPEN_APP", json!({}))).await.is_none());
        assert!(exec.execute(&intent("TAKE_SCREENSHOT", json!({}))).await.is_none());
    }

    #[tokio::test]
    async fn unknown_gets_apology() {
        let feedback = DescribingExecutor.execute(&Intent::unknown()).await.unwrap();
        assert!(feedback.contains("didn't understand"));
    }
}
