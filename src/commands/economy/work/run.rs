//! This module implements the `work` command, supporting both prefix and slash commands.

use super::logic::perform_work;
use crate::commands::{Caller, reply};
use crate::model::AppState;
use chrono::Utc;
use serenity::builder::CreateCommand;
use serenity::model::application::CommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::*;

pub fn register() -> CreateCommand {
    CreateCommand::new("work").description("Work a shift at the track to earn coins.")
}

pub async fn run_slash(ctx: &Context, interaction: &CommandInteraction, state: &AppState) {
    reply::defer_slash(ctx, interaction, false).await;
    let text = perform_work(state, &Caller::from(&interaction.user), Utc::now()).await;
    reply::followup(ctx, interaction, text).await;
}

pub async fn run_prefix(ctx: &Context, msg: &Message, state: &AppState) {
    let text = perform_work(state, &Caller::from(&msg.author), Utc::now()).await;
    reply::to_message(ctx, msg, "work", text).await;
}
