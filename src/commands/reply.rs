//! Shared reply helpers for prefix and slash commands.
//! Send failures are logged with a tag and never propagate: a reply that
//! could not be delivered must not take the handler down.

use serenity::builder::{CreateInteractionResponseFollowup, CreateMessage};
use serenity::model::application::CommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;

/// Acknowledge a slash command so slow store calls don't hit Discord's 3s limit.
pub async fn defer_slash(ctx: &Context, interaction: &CommandInteraction, ephemeral: bool) {
    let res = if ephemeral {
        interaction.defer_ephemeral(&ctx.http).await
    } else {
        interaction.defer(&ctx.http).await
    };
    if let Err(e) = res {
        tracing::debug!(target="cmd.reply", command=%interaction.data.name, error=?e, "defer failed (already acknowledged?)");
    }
}

pub async fn followup(ctx: &Context, interaction: &CommandInteraction, text: String) {
    let builder = CreateInteractionResponseFollowup::new().content(text);
    if let Err(e) = interaction.create_followup(&ctx.http, builder).await {
        tracing::error!(target="cmd.reply", command=%interaction.data.name, error=?e, "followup failed");
    }
}

pub async fn to_message(ctx: &Context, msg: &Message, tag: &str, text: String) {
    let builder = CreateMessage::new().content(text).reference_message(msg);
    if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
        tracing::error!(target="cmd.reply", tag=%tag, channel=%msg.channel_id, error=?e, "send_message failed");
    }
}
