//! Project statistics: fold every participant's legs into per-type totals.
//!
//! - `breakdown_by_type` always lists every participant `ActivityType`, zeros included,
//!   so consumers can render a fixed set of rows.
//! - Legs with an uncounted distance (≤ 0, NaN, ∞) are skipped entirely: they add
//!   neither distance, CO₂, nor count.
//! - `total_co2` is the sum of the per-type CO₂ in `ActivityType` order;
//!   `average_co2` divides by the number of participants (0 when there are none).

use std::collections::BTreeMap;

use gx_core::{ActivityRecord, ActivityType, EmissionModel, ProjectStats, TypeBreakdown};

use crate::offset::trees_needed;

/// Aggregate `participants` (one slice of legs per participant).
pub fn calculate_project_stats<P: AsRef<[ActivityRecord]>>(
    model: &EmissionModel,
    participants: &[P],
) -> ProjectStats {
    let mut breakdown: BTreeMap<ActivityType, TypeBreakdown> = ActivityType::ALL
        .iter()
        .map(|&t| (t, TypeBreakdown::default()))
        .collect();

    for legs in participants {
        for leg in legs.as_ref() {
            let Some(distance) = leg.counted_distance() else { continue };
            let row = breakdown.entry(leg.activity_type).or_default();
            row.distance += distance;
            row.co2 += distance * model.transport.get(leg.activity_type);
            row.count += 1;
        }
    }

    let total_participants = participants.len() as u64;
    let total_co2: f64 = breakdown.values().map(|b| b.co2).sum();
    let average_co2 = if total_participants == 0 {
        0.0
    } else {
        total_co2 / total_participants as f64
    };

    ProjectStats {
        total_participants,
        total_co2,
        average_co2,
        breakdown_by_type: breakdown,
        trees_needed: trees_needed(total_co2, model),
    }
}
