//! Implements the `currency` command (aliases `balance`, `bal`).

use crate::commands::guard::{self, Requirement};
use crate::commands::{Caller, reply, something_went_wrong};
use crate::database::LedgerError;
use crate::model::AppState;
use serenity::builder::CreateCommand;
use serenity::model::application::CommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::*;

pub fn register() -> CreateCommand {
    CreateCommand::new("currency").description("Show how many coins you have.")
}

pub async fn show_balance(state: &AppState, caller: &Caller) -> String {
    if let Err(reply) = guard::enforce(
        &state.ledger,
        caller,
        Requirement::Registered,
        &state.prefix,
        "retrieving currency",
    )
    .await
    {
        return reply;
    }

    match state.ledger.balance(caller.identity).await {
        Ok(amount) => format!("{} has ${amount}", caller.mention),
        Err(LedgerError::NotFound(_)) => guard::not_registered(&caller.mention, &state.prefix),
        Err(e) => {
            tracing::error!(target="cmd.currency", identity=%caller.identity, error=%e, "balance lookup failed");
            something_went_wrong("retrieving currency")
        }
    }
}

pub async fn run_slash(ctx: &Context, interaction: &CommandInteraction, state: &AppState) {
    reply::defer_slash(ctx, interaction, true).await;
    let text = show_balance(state, &Caller::from(&interaction.user)).await;
    reply::followup(ctx, interaction, text).await;
}

pub async fn run_prefix(ctx: &Context, msg: &Message, state: &AppState) {
    let text = show_balance(state, &Caller::from(&msg.author)).await;
    reply::to_message(ctx, msg, "currency", text).await;
}
