use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookbot::config::BotConfig;
use hookbot::message::InboundMessage;
use hookbot::triggers::TriggerRegistry;
use hookbot::webhook;

fn builtin_triggers(config: &BotConfig) -> TriggerRegistry {
    let mut registry = TriggerRegistry::new();
    registry.register("^!ping", |_: &InboundMessage| "pong".to_string());

    for reply in &config.replies {
        registry.register_reply(reply.pattern.clone(), reply.reply.clone());
    }
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hookbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bot_cfg.json"));

    info!("Loading configuration from: {}", config_path.display());
    let config = BotConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("  Bot: {}", config.bot_id);
    info!("  Group: {}", config.group_id);
    info!("  Audit log: {}", config.logfile.display());

    let registry = builtin_triggers(&config);

    info!("Bot is starting...");
    webhook::serve(Arc::new(config), registry).await?;

    Ok(())
}
