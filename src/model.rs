//! This module defines the shared state handed to every command handler.
//! It is built once in `main.rs` and owned by the event handler; nothing here
//! lives in a global.

use crate::config::{BotConfig, EconomySettings};
use crate::database::Ledger;
use serenity::model::id::UserId;

/// The central, shared state of the application.
pub struct AppState {
    /// The only way commands read or change account state.
    pub ledger: Ledger,
    pub economy: EconomySettings,
    /// The command prefix for text commands, e.g. `!`.
    pub prefix: String,
    /// Who may run the `/ledger` maintenance command. `None` disables it.
    pub owner_id: Option<UserId>,
}

impl AppState {
    pub fn new(ledger: Ledger, config: &BotConfig) -> Self {
        Self {
            ledger,
            economy: config.economy.clone(),
            prefix: config.prefix.clone(),
            owner_id: config.owner_id.map(|id| UserId::new(id.get())),
        }
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == Some(user_id)
    }
}
