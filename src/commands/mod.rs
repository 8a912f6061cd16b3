// src/commands/mod.rs
// Command modules plus the little bits every command shares.

pub mod admin;
pub mod economy;
pub mod guard;
pub mod reply;

use crate::database::Identity;
use serenity::model::user::User;
use serenity::prelude::Mentionable;

/// Who invoked a command, reduced to what the economy commands need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub identity: Identity,
    /// Plain username, used where the original replies did not ping.
    pub name: String,
    /// `<@id>`, pings the user.
    pub mention: String,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            identity: Identity::from(user.id),
            name: user.name.clone(),
            mention: user.mention().to_string(),
        }
    }
}

pub fn something_went_wrong(action: &str) -> String {
    format!("Something went wrong while {action}. Please try again.")
}
