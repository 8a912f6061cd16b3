//! Contains the core logic for the `work` command.

use super::jobs::pick_job;
use super::ui;
use crate::commands::guard::{self, Requirement};
use crate::commands::{Caller, something_went_wrong};
use crate::database::{GrantOutcome, LedgerError};
use crate::model::AppState;
use chrono::{DateTime, Utc};

/// The shared core logic for the work command. Returns the reply text.
///
/// The cooldown check and the payout happen in one ledger call, so spamming
/// the command can never pay twice inside one cooldown window.
pub async fn perform_work(state: &AppState, caller: &Caller, now: DateTime<Utc>) -> String {
    if let Err(reply) = guard::enforce(
        &state.ledger,
        caller,
        Requirement::Registered,
        &state.prefix,
        "working",
    )
    .await
    {
        return reply;
    }

    let job = pick_job();
    let outcome = state
        .ledger
        .grant_reward_if_eligible(caller.identity, job.payout, now, state.economy.work_cooldown)
        .await;

    match outcome {
        Ok(GrantOutcome::Granted { amount, balance, .. }) => {
            tracing::info!(target="cmd.work", identity=%caller.identity, job=job.name, amount, balance, "work granted");
            ui::worked(&caller.name, job, amount)
        }
        Ok(GrantOutcome::OnCooldown { remaining }) => ui::on_cooldown(&caller.mention, remaining),
        // Removed between the guard and the grant.
        Err(LedgerError::NotFound(_)) => guard::not_registered(&caller.mention, &state.prefix),
        Err(e) => {
            tracing::error!(target="cmd.work", identity=%caller.identity, error=%e, "grant failed");
            something_went_wrong("working")
        }
    }
}
