// Library entry so integration tests and external tools can reference internal modules.
// Re-export the same modules used by the binary (`main.rs`).
pub mod commands;
pub mod config;
pub mod database;
pub mod handler;
pub mod model;

pub use config::BotConfig;
pub use database::Ledger;
pub use model::AppState;
