//! Registration preconditions for economy commands.
//!
//! `join` requires the caller to be unknown; every other economy command
//! requires a registered caller. Handlers call [`enforce`] before touching the
//! ledger and send back the refusal text when it says no.

use super::Caller;
use crate::database::{Identity, Ledger, LedgerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Registered,
    Unregistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    MustRegisterFirst,
    AlreadyRegistered,
}

impl Gate {
    /// The reply for a refused caller; `None` when allowed.
    pub fn refusal(self, mention: &str, prefix: &str) -> Option<String> {
        match self {
            Gate::Allowed => None,
            Gate::MustRegisterFirst => Some(not_registered(mention, prefix)),
            Gate::AlreadyRegistered => Some(already_registered(mention)),
        }
    }
}

pub fn evaluate(requirement: Requirement, is_registered: bool) -> Gate {
    match (requirement, is_registered) {
        (Requirement::Registered, false) => Gate::MustRegisterFirst,
        (Requirement::Unregistered, true) => Gate::AlreadyRegistered,
        _ => Gate::Allowed,
    }
}

pub async fn check(
    ledger: &Ledger,
    identity: Identity,
    requirement: Requirement,
) -> Result<Gate, LedgerError> {
    let is_registered = ledger.exists(identity).await?;
    Ok(evaluate(requirement, is_registered))
}

/// `Ok(())` when the command may proceed, otherwise the text to reply with.
/// `action` completes "Something went wrong while ..." if the store fails.
pub async fn enforce(
    ledger: &Ledger,
    caller: &Caller,
    requirement: Requirement,
    prefix: &str,
    action: &str,
) -> Result<(), String> {
    match check(ledger, caller.identity, requirement).await {
        Ok(gate) => match gate.refusal(&caller.mention, prefix) {
            None => Ok(()),
            Some(reply) => Err(reply),
        },
        Err(e) => {
            tracing::error!(target="cmd.guard", identity=%caller.identity, error=%e, "registration check failed");
            Err(super::something_went_wrong(action))
        }
    }
}

pub fn not_registered(mention: &str, prefix: &str) -> String {
    format!("{mention} is not registered. Use {prefix}join")
}

pub fn already_registered(mention: &str) -> String {
    format!("{mention} is already registered")
}
