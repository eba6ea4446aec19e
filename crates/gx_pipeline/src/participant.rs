//! Participant mode: one questionnaire, optionally on top of a project baseline.

use gx_algo::{answers_to_activities, calculate_emissions};
use gx_core::{ActivityRecord, EmissionCalculation, EmissionModel, ParticipantAnswers, ProjectActivityType};

/// Borrowed inputs for a single participant run.
#[derive(Debug, Clone, Copy)]
pub struct ParticipantCtx<'a> {
    pub model: &'a EmissionModel,
    pub answers: &'a ParticipantAnswers,
    /// Project baseline legs; empty when the run has none.
    pub activities: &'a [ActivityRecord<ProjectActivityType>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantOutputs {
    /// One-way legs implied by the answers.
    pub legs: Vec<ActivityRecord>,
    pub emissions: EmissionCalculation,
}

pub fn run_participant(ctx: &ParticipantCtx<'_>) -> ParticipantOutputs {
    ParticipantOutputs {
        legs: answers_to_activities(ctx.answers),
        emissions: calculate_emissions(ctx.model, ctx.answers, Some(ctx.activities)),
    }
}
