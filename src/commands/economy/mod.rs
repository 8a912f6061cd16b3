//! This module contains all commands related to the server economy.

pub mod balance;
pub mod join;
pub mod work;

pub use balance::{run_prefix as currency_prefix, run_slash as currency_slash};
pub use join::{run_prefix as join_prefix, run_slash as join_slash};
pub use work::run::{run_prefix as work_prefix, run_slash as work_slash};
