//! Project mode: every participant's footprint, project statistics, leaderboard.
//!
//! - Each submitted participant is calculated on top of the project's baseline legs.
//! - Statistics fold every participant's one-way legs (unsubmitted participants
//!   count towards `totalParticipants` with no legs).
//! - The participant table keeps bundle order unless a `TableOrder` is given.

use gx_algo::{
    answers_to_activities, calculate_activities_co2, calculate_emissions, calculate_project_stats,
    rank_participants, LeaderboardEntry,
};
use gx_core::determinism::{sort_by_field, ParticipantField, SortFields, SortValue};
use gx_core::{
    ActivityRecord, EmissionCalculation, EmissionModel, ParticipantSummary, ProjectStats, ProjectSummary,
};
use gx_io::loader::ProjectBundle;
use tracing::debug;

/// Requested order of the participant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOrder {
    pub field: ParticipantField,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectCtx<'a> {
    pub model: &'a EmissionModel,
    pub bundle: &'a ProjectBundle,
    pub order: Option<TableOrder>,
}

/// One row of the participant table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantResult {
    pub summary: ParticipantSummary,
    /// `None` until the participant submits.
    pub emissions: Option<EmissionCalculation>,
}

impl SortFields for ParticipantResult {
    type Field = ParticipantField;
    fn sort_value(&self, field: ParticipantField) -> SortValue<'_> {
        self.summary.sort_value(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOutputs {
    pub project: ProjectSummary,
    pub project_activities_co2: f64,
    pub stats: ProjectStats,
    pub participants: Vec<ParticipantResult>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub fn run_project(ctx: &ProjectCtx<'_>) -> ProjectOutputs {
    let model = ctx.model;
    let bundle = ctx.bundle;
    let baseline = bundle.activities.as_slice();

    let mut legs: Vec<Vec<ActivityRecord>> = Vec::with_capacity(bundle.participants.len());
    let mut participants = Vec::with_capacity(bundle.participants.len());
    for p in &bundle.participants {
        let emissions = p.answers.as_ref().map(|a| calculate_emissions(model, a, Some(baseline)));
        if emissions.is_none() {
            debug!(participant = %p.id, "participant has not submitted");
        }
        legs.push(p.answers.as_ref().map(answers_to_activities).unwrap_or_default());
        participants.push(ParticipantResult {
            summary: ParticipantSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                country: p.country.clone(),
                submitted_at: p.submitted_at,
                total_co2: emissions.map(|e| e.total_co2),
            },
            emissions,
        });
    }

    let stats = calculate_project_stats(model, &legs);
    let summaries: Vec<ParticipantSummary> = participants.iter().map(|r| r.summary.clone()).collect();
    let leaderboard = rank_participants(&summaries);

    if let Some(order) = ctx.order {
        sort_by_field(&mut participants, order.field, order.descending);
    }

    let submitted: Vec<f64> = participants.iter().filter_map(|r| r.summary.total_co2).collect();
    let info = &bundle.project;
    let project = ProjectSummary {
        id: info.id.clone(),
        name: info.name.clone(),
        location: info.location.clone(),
        start_date: info.start_date,
        end_date: info.end_date,
        created_at: info.created_at,
        participant_count: u32::try_from(bundle.participants.len()).unwrap_or(u32::MAX),
        total_co2: (!submitted.is_empty()).then(|| submitted.iter().sum()),
    };

    ProjectOutputs {
        project,
        project_activities_co2: calculate_activities_co2(model, baseline),
        stats,
        participants,
        leaderboard,
    }
}
