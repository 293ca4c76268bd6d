//! Voxa assistant — voice command loop.
//!
//! Reads utterances (stdin stands in for the recognizer), resolves them to
//! intents, and speaks the result. Learned and mined rules persist across
//! runs in the configured rule store.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use vx_assistant::assistant::{Assistant, Collaborators};
use vx_assistant::config::AssistantConfig;

const DEFAULT_CONFIG_PATH: &str = "assistant.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ─────────────────────────────────────────────
    let explicit = std::env::args().nth(1);
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if explicit.is_some() || Path::new(&config_path).exists() {
        Some(AssistantConfig::from_file(&config_path)?)
    } else {
        None
    };
    let loaded = config.is_some();
    let config = config.unwrap_or_default();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vx-assistant starting");
    if loaded {
        tracing::info!(path = %config_path, "config loaded");
    } else {
        tracing::info!(path = %config_path, "no config file, using defaults");
    }
    tracing::info!(
        mode = %config.default_mode,
        rules = %config.paths.rules.display(),
        log = %config.paths.log.display(),
        ai_router = config.ai_router.enabled,
        proposals = config.proposals.enabled,
        "configuration"
    );

    // ── Build the assistant ─────────────────────────────────────
    let mut assistant = Assistant::from_config(&config, Collaborators::console(&config));

    // ── Mine logs for new rules ─────────────────────────────────
    match assistant.mine_logs().await {
        Ok(promoted) => tracing::info!(promoted, "log mining finished"),
        Err(e) => tracing::warn!(error = %e, "log mining failed"),
    }

    tracing::info!("vx-assistant ready");

    // Graceful shutdown on SIGINT, observed between utterances
    assistant
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("vx-assistant stopped");
    Ok(())
}
