//! Defines every job a user can land when they work, and its payout.

use rand::{Rng, rng};

pub struct Job {
    /// Past-tense blurb, e.g. "won a derby".
    pub name: &'static str,
    pub payout: i64,
}

pub static JOBS: &[Job] = &[
    Job {
        name: "cleaned porta potties",
        payout: 100,
    },
    Job {
        name: "commentated for derby",
        payout: 600,
    },
    Job {
        name: "won a derby",
        payout: 1000,
    },
    Job {
        name: "sold merchandise",
        payout: 300,
    },
    Job {
        name: "worked pit crew",
        payout: 500,
    },
    Job {
        name: "watered the track",
        payout: 100,
    },
    Job {
        name: "worked the food stand",
        payout: 200,
    },
    Job {
        name: "worked the entrance",
        payout: 600,
    },
    Job {
        name: "worked security detail",
        payout: 400,
    },
    Job {
        name: "cleaned the cars",
        payout: 700,
    },
];

/// Picks a job uniformly at random.
pub fn pick_job() -> &'static Job {
    &JOBS[rng().random_range(0..JOBS.len())]
}
