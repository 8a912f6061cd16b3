use crate::database::{Identity, UserAccount};
use crate::model::AppState;
use chrono::{DateTime, Utc};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::{CommandDataOptionValue, CommandInteraction, CommandOptionType};
use serenity::model::id::UserId;
use serenity::prelude::Context;

use super::reply;

// Owner-only maintenance over the ledger. Never routed from prefix commands.
const MAX_LISTED: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    List,
    Adjust { identity: Identity, delta: i64 },
    Remove(Identity),
    Purge,
}

pub fn register() -> CreateCommand {
    CreateCommand::new("ledger")
        .description("Ledger maintenance (owner-only)")
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "list",
            "List registered accounts",
        ))
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::SubCommand,
                "adjust",
                "Add or remove coins from a user",
            )
            .add_sub_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Account to adjust")
                    .required(true),
            )
            .add_sub_option(
                CreateCommandOption::new(
                    CommandOptionType::Integer,
                    "amount",
                    "Coins to add (negative to remove)",
                )
                .required(true),
            ),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "remove", "Delete one account")
                .add_sub_option(
                    CreateCommandOption::new(CommandOptionType::User, "user", "Account to delete")
                        .required(true),
                ),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "purge",
            "Delete every account",
        ))
}

fn parse_action(interaction: &CommandInteraction) -> Option<LedgerAction> {
    let sub = interaction.data.options.first()?;
    let CommandDataOptionValue::SubCommand(nested) = &sub.value else {
        return None;
    };
    let user = || {
        nested
            .iter()
            .find(|o| o.name == "user")
            .and_then(|o| o.value.as_user_id())
            .map(Identity::from)
    };
    match sub.name.as_str() {
        "list" => Some(LedgerAction::List),
        "purge" => Some(LedgerAction::Purge),
        "remove" => user().map(LedgerAction::Remove),
        "adjust" => {
            let delta = nested
                .iter()
                .find(|o| o.name == "amount")
                .and_then(|o| o.value.as_i64())?;
            Some(LedgerAction::Adjust {
                identity: user()?,
                delta,
            })
        }
        _ => None,
    }
}

/// Runs one action and describes the result. Errors become text; nothing panics.
pub async fn perform(state: &AppState, invoker: UserId, action: LedgerAction) -> String {
    if !state.is_owner(invoker) {
        return "This command is restricted to the bot owner.".to_string();
    }
    tracing::info!(target="cmd.ledger", invoker=%invoker, ?action, "ledger maintenance");
    let ledger = &state.ledger;
    let res = match action {
        LedgerAction::List => ledger
            .list_all()
            .await
            .map(|accounts| render_accounts(&accounts, Utc::now())),
        LedgerAction::Adjust { identity, delta } => ledger
            .adjust_balance(identity, delta)
            .await
            .map(|balance| format!("User {identity} now has ${balance}.")),
        LedgerAction::Remove(identity) => ledger.remove(identity).await.map(|removed| {
            if removed {
                format!("Removed user {identity}.")
            } else {
                format!("User {identity} was not registered.")
            }
        }),
        LedgerAction::Purge => ledger
            .remove_all()
            .await
            .map(|n| format!("Removed {n} accounts.")),
    };
    res.unwrap_or_else(|e| {
        tracing::warn!(target="cmd.ledger", ?action, error=%e, "ledger maintenance failed");
        format!("Ledger error: {e}")
    })
}

/// One line per account, at most [`MAX_LISTED`], largest balance first.
pub fn render_accounts(accounts: &[UserAccount], now: DateTime<Utc>) -> String {
    if accounts.is_empty() {
        return "No registered accounts.".to_string();
    }
    let mut sorted: Vec<&UserAccount> = accounts.iter().collect();
    sorted.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.identity.cmp(&b.identity)));
    let mut lines: Vec<String> = sorted
        .iter()
        .take(MAX_LISTED)
        .map(|a| {
            let cooldown = match a.cooldown_until {
                Some(until) if until > now => {
                    format!("on cooldown until {}", until.format("%Y-%m-%d %H:%M UTC"))
                }
                _ => "can work".to_string(),
            };
            format!("`{}` ${} ({cooldown})", a.identity, a.balance)
        })
        .collect();
    if accounts.len() > MAX_LISTED {
        lines.push(format!("... and {} more", accounts.len() - MAX_LISTED));
    }
    format!("{} accounts\n{}", accounts.len(), lines.join("\n"))
}

pub async fn run_slash(ctx: &Context, interaction: &CommandInteraction, state: &AppState) {
    reply::defer_slash(ctx, interaction, true).await;
    let text = match parse_action(interaction) {
        Some(action) => perform(state, interaction.user.id, action).await,
        None => "Unknown ledger action.".to_string(),
    };
    reply::followup(ctx, interaction, text).await;
}
