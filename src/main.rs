use std::sync::Arc;

use beamconomy_bot::handler::Handler;
use beamconomy_bot::{AppState, BotConfig, Ledger};
use serenity::model::gateway::GatewayIntents;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = BotConfig::from_env().inspect_err(|e| error!(error = %e, "bad configuration"))?;

    // The schema must be in place before the first command can arrive.
    let ledger = Ledger::open(&config.store).await?;
    ledger.ensure_schema().await?;

    let state = Arc::new(AppState::new(ledger, &config));
    let allowed_guild_id = config.guild_id.map(|id| GuildId::new(id.get()));

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler {
            state: Arc::clone(&state),
            allowed_guild_id,
        })
        .await
        .inspect_err(|e| error!(error = ?e, "could not create the Discord client"))?;

    info!(prefix = %state.prefix, "starting bot");
    if let Err(why) = client.start().await {
        error!(error = ?why, "client error");
    }

    state.ledger.close().await;
    info!("closing application");
    Ok(())
}
