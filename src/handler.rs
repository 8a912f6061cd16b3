use crate::commands;
use crate::model::AppState;
use serenity::async_trait;
use serenity::builder::CreateCommand;
use serenity::client::Context;
use serenity::model::application::{Command as SlashCommand, Interaction};
use serenity::model::{channel::Message, gateway::Ready, id::GuildId};
use serenity::prelude::EventHandler;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Join,
    Work,
    Currency,
    Unknown,
}

impl FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "join" => Ok(Command::Join),
            "work" | "w" => Ok(Command::Work),
            "currency" | "balance" | "bal" => Ok(Command::Currency),
            _ => Ok(Command::Unknown),
        }
    }
}

/// Splits `!work extra args` into the command. `None` when the prefix is absent.
pub fn parse_command(content: &str, prefix: &str) -> Option<Command> {
    let body = content.strip_prefix(prefix)?;
    let name = body.split_whitespace().next()?;
    Some(Command::from_str(name).unwrap_or(Command::Unknown))
}

pub fn slash_commands() -> Vec<CreateCommand> {
    vec![
        commands::economy::join::register(),
        commands::economy::work::run::register(),
        commands::economy::balance::register(),
        commands::admin::register(),
    ]
}

pub struct Handler {
    pub state: Arc<AppState>,
    /// When set, everything outside this guild is ignored.
    pub allowed_guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = &interaction else {
            return;
        };
        if let Some(allowed) = self.allowed_guild_id
            && command.guild_id != Some(allowed)
        {
            return;
        }
        let state = self.state.as_ref();
        match command.data.name.as_str() {
            "join" => commands::economy::join_slash(&ctx, command, state).await,
            "work" => commands::economy::work_slash(&ctx, command, state).await,
            "currency" => commands::economy::currency_slash(&ctx, command, state).await,
            "ledger" => commands::admin::run_slash(&ctx, command, state).await,
            other => tracing::debug!(target="handler", command=%other, "unhandled slash command"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        if let Some(allowed) = self.allowed_guild_id
            && msg.guild_id != Some(allowed)
        {
            return;
        }
        let state = self.state.as_ref();
        let Some(command) = parse_command(&msg.content, &state.prefix) else {
            return;
        };
        match command {
            Command::Join => commands::economy::join_prefix(&ctx, &msg, state).await,
            Command::Work => commands::economy::work_prefix(&ctx, &msg, state).await,
            Command::Currency => commands::economy::currency_prefix(&ctx, &msg, state).await,
            Command::Unknown => {}
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(target="handler", user=%ready.user.name, guilds=ready.guilds.len(), "connected and ready");
        let registered = match self.allowed_guild_id {
            Some(guild) => guild
                .set_commands(&ctx.http, slash_commands())
                .await
                .map(|c| c.len()),
            None => SlashCommand::set_global_commands(&ctx.http, slash_commands())
                .await
                .map(|c| c.len()),
        };
        match registered {
            Ok(count) => tracing::info!(target="handler", count, "registered slash commands"),
            Err(e) => tracing::error!(target="handler", error=?e, "failed to register slash commands"),
        }
    }
}
