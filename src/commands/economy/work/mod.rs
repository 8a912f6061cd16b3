//! This module implements the `work` command, allowing registered users to earn currency
//! once per cooldown window.

pub mod jobs;
pub mod logic;
pub mod run;
pub mod ui;
