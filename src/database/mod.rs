//! This module acts as a central hub for all database-related logic.
//! Command handlers only ever talk to [`Ledger`]; the submodules below hold
//! the queries, the schema and the row types it is built from.

pub mod economy;
pub mod error;
pub mod init;
pub mod ledger;
pub mod models;
pub mod schema;

pub use error::LedgerError;
pub use init::{DbPool, StoreConfig};
pub use ledger::Ledger;
pub use models::{GrantOutcome, Identity, UserAccount};
pub use schema::{LegacyShape, SchemaStatus};
