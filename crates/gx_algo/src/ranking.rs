//! Ordering of project and participant lists.
//!
//! Thin wrappers over `gx_core::determinism::create_comparator`, plus the
//! participant leaderboard: ascending total CO₂ (lowest footprint first),
//! participants without a submission listed last and unranked.
//! Equal totals share a rank ("1, 1, 3" competition ranking).

use gx_core::determinism::{sort_by_field, ParticipantField, ProjectField};
use gx_core::{ParticipantId, ParticipantSummary, ProjectSummary};

/// Sort a project table in place by `field`.
pub fn sort_projects(rows: &mut [ProjectSummary], field: ProjectField, descending: bool) {
    sort_by_field(rows, field, descending);
}

/// Sort a participant table in place by `field`.
pub fn sort_participants(rows: &mut [ParticipantSummary], field: ParticipantField, descending: bool) {
    sort_by_field(rows, field, descending);
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    /// `None` for participants who have not submitted yet.
    pub rank: Option<u32>,
    pub participant_id: ParticipantId,
    pub name: String,
    pub total_co2: Option<f64>,
}

/// Build the leaderboard. The input order only matters for breaking ties
/// between equal totals (stable sort).
pub fn rank_participants(rows: &[ParticipantSummary]) -> Vec<LeaderboardEntry> {
    let mut sorted = rows.to_vec();
    sort_participants(&mut sorted, ParticipantField::TotalCo2, false);

    let mut out = Vec::with_capacity(sorted.len());
    let mut prev: Option<(f64, u32)> = None;
    for (i, row) in sorted.into_iter().enumerate() {
        let position = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let rank = match row.total_co2.filter(|t| !t.is_nan()) {
            Some(total) => {
                let r = match prev {
                    Some((p, r)) if p == total => r,
                    _ => position,
                };
                prev = Some((total, r));
                Some(r)
            }
            None => None,
        };
        out.push(LeaderboardEntry {
            rank,
            participant_id: row.id,
            name: row.name,
            total_co2: row.total_co2,
        });
    }
    out
}
