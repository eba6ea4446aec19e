// crates/gx_algo/src/lib.rs
//! Pure calculators over `gx_core` types.
//!
//! Every function here is synchronous and side-effect free: it reads an
//! `EmissionModel` by reference plus its own arguments and returns plain values.
//! Invalid or partial input degrades to zero contributions; nothing here fails.
#![forbid(unsafe_code)]

// ----------------------------- Calculators (public surface) ---------------------------

pub mod activities;
pub mod offset;
pub mod questionnaire;

pub use activities::{calculate_activities_co2, leg_co2};
pub use offset::{trees_needed, trees_needed_default};
pub use questionnaire::{answers_to_activities, calculate_emissions, transport_one_way_co2};

// ----------------------------- Aggregation & ordering --------------------------------

#[cfg(feature = "stats")]
pub mod stats;
#[cfg(feature = "stats")]
pub use stats::calculate_project_stats;

#[cfg(feature = "ranking")]
pub mod ranking;
#[cfg(feature = "ranking")]
pub use ranking::{rank_participants, sort_participants, sort_projects, LeaderboardEntry};
