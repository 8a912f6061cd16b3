//! Implements the `join` command: registers the caller with the starting balance.

use crate::commands::guard::{self, Requirement};
use crate::commands::{Caller, reply, something_went_wrong};
use crate::model::AppState;
use serenity::builder::CreateCommand;
use serenity::model::application::CommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::*;

pub fn register() -> CreateCommand {
    CreateCommand::new("join").description("Join the economy and collect your starting coins.")
}

pub async fn perform_join(state: &AppState, caller: &Caller) -> String {
    if let Err(reply) = guard::enforce(
        &state.ledger,
        caller,
        Requirement::Unregistered,
        &state.prefix,
        "joining",
    )
    .await
    {
        return reply;
    }

    let starting = state.economy.starting_balance;
    match state.ledger.register(caller.identity, starting).await {
        Ok(true) => {
            tracing::info!(target="cmd.join", identity=%caller.identity, starting, "user joined");
            format!(
                "{} has been awarded ${starting} for joining {}!",
                caller.mention, state.economy.name
            )
        }
        // Lost a race with another `join` from the same user.
        Ok(false) => guard::already_registered(&caller.mention),
        Err(e) => {
            tracing::error!(target="cmd.join", identity=%caller.identity, error=%e, "register failed");
            something_went_wrong("joining")
        }
    }
}

pub async fn run_slash(ctx: &Context, interaction: &CommandInteraction, state: &AppState) {
    reply::defer_slash(ctx, interaction, false).await;
    let text = perform_join(state, &Caller::from(&interaction.user)).await;
    reply::followup(ctx, interaction, text).await;
}

pub async fn run_prefix(ctx: &Context, msg: &Message, state: &AppState) {
    let text = perform_join(state, &Caller::from(&msg.author)).await;
    reply::to_message(ctx, msg, "join", text).await;
}
