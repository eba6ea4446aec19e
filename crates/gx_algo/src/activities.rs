//! Activity CO₂ summation (project baseline and participant legs).
//!
//! Inputs:
//! - `model`: calibration constants (transport factors)
//! - `activities`: typed legs; `T` is either participant or project activity set
//!
//! Rules in this layer:
//! - A leg contributes `distance_km * factor` only when the distance is finite and > 0.
//! - Zero, negative, NaN or infinite distances contribute 0 and are not errors.
//! - Unknown activity types cannot reach this layer; `gx_io::ingest` drops them
//!   at the boundary (with a diagnostic) before typing.
//!
//! Output is a plain kg CO₂ value, never negative, 0 for an empty list.

use gx_core::{ActivityRecord, ActivityType, EmissionModel};

/// CO₂ of a single leg (0 for an uncounted distance).
#[inline]
pub fn leg_co2<T: Copy + Into<ActivityType>>(model: &EmissionModel, leg: &ActivityRecord<T>) -> f64 {
    match leg.counted_distance() {
        Some(d) => d * model.transport.get(leg.activity_type.into()),
        None => 0.0,
    }
}

/// Sum of CO₂ across all legs, in kg.
pub fn calculate_activities_co2<T: Copy + Into<ActivityType>>(
    model: &EmissionModel,
    activities: &[ActivityRecord<T>],
) -> f64 {
    activities.iter().map(|a| leg_co2(model, a)).sum()
}
