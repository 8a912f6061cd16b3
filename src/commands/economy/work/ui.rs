//! Reply text for the `work` command.

use super::jobs::Job;
use chrono::Duration;

pub fn worked(name: &str, job: &Job, amount: i64) -> String {
    format!("{name} {}: ${amount}", job.name)
}

pub fn on_cooldown(mention: &str, remaining: Duration) -> String {
    format!(
        "{mention} must wait {} before working again",
        format_cooldown(remaining)
    )
}

/// Formats a remaining cooldown as `H:MM`, rounding down. Negative reads `0:00`.
pub fn format_cooldown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    format!("{hours}:{minutes:02}")
}
