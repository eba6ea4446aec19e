//! build_result.rs — result artifacts with content-derived ids.
//!
//! The id is `GXR:` + SHA-256 of the canonical document **without** its `id`
//! field (an empty `id` is skipped on serialization). Sealing re-reads the final
//! bytes, strips the embedded id and re-hashes the remainder before handing the
//! bytes' SHA-256 to the run record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gx_algo::LeaderboardEntry;
use gx_core::determinism::ParticipantField;
use gx_core::{
    ActivityRecord, EmissionCalculation, ParticipantId, ParticipantSummary, ProjectStats, ProjectSummary,
};
use gx_io::{canonical_json::to_canonical_bytes, hasher, loader::LoadedModel};

use crate::participant::ParticipantOutputs;
use crate::project::{ProjectOutputs, TableOrder};
use crate::PipelineError;

/// `emissions.json` — participant mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub model_version: String,
    pub model_sha256: String,
    pub legs: Vec<ActivityRecord>,
    pub emissions: EmissionCalculation,
}

/// `project_report.json` — project mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReportDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub model_version: String,
    pub model_sha256: String,
    pub project: ProjectSummary,
    pub project_activities_co2: f64,
    pub stats: ProjectStats,
    pub participants: Vec<ParticipantRow>,
    pub leaderboard: Vec<LeaderboardRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_order: Option<TableOrderEcho>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRow {
    #[serde(flatten)]
    pub summary: ParticipantSummary,
    pub emissions: Option<EmissionCalculation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: Option<u32>,
    pub participant_id: ParticipantId,
    pub name: String,
    #[serde(rename = "totalCO2")]
    pub total_co2: Option<f64>,
}

impl From<LeaderboardEntry> for LeaderboardRow {
    fn from(e: LeaderboardEntry) -> Self {
        Self { rank: e.rank, participant_id: e.participant_id, name: e.name, total_co2: e.total_co2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOrderEcho {
    pub field: ParticipantField,
    pub descending: bool,
}

impl From<TableOrder> for TableOrderEcho {
    fn from(o: TableOrder) -> Self {
        Self { field: o.field, descending: o.descending }
    }
}

/// Documents that carry a content-derived `GXR:` id.
pub trait Sealed: Serialize {
    fn id_mut(&mut self) -> &mut String;
}

impl Sealed for EmissionsDoc {
    fn id_mut(&mut self) -> &mut String { &mut self.id }
}

impl Sealed for ProjectReportDoc {
    fn id_mut(&mut self) -> &mut String { &mut self.id }
}

/// Assign the id, verify it, and return the SHA-256 of the final canonical bytes.
pub fn seal<D: Sealed>(doc: &mut D) -> Result<String, PipelineError> {
    doc.id_mut().clear();
    let id = hasher::result_id_from_canonical(&*doc)?;
    *doc.id_mut() = id.to_string();

    let bytes = to_canonical_bytes(&*doc)?;
    verify_sealed_bytes(&bytes)?;
    Ok(hasher::sha256_hex(&bytes))
}

/// The `id` embedded in sealed bytes must be the `GXR:` hash of everything else.
pub fn verify_sealed_bytes(bytes: &[u8]) -> Result<(), PipelineError> {
    let mut value: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::Build(format!("sealed document does not parse: {e}")))?;
    let embedded = match value.as_object_mut().and_then(|o| o.remove("id")) {
        Some(Value::String(s)) => s,
        _ => return Err(PipelineError::Build("sealed document has no string id".into())),
    };
    let expected = hasher::result_id_from_canonical(&value)?;
    if embedded != expected.as_str() {
        return Err(PipelineError::Build(format!(
            "result id {embedded} does not match payload {expected}"
        )));
    }
    Ok(())
}

pub fn build_emissions_doc(
    model: &LoadedModel,
    outs: ParticipantOutputs,
) -> Result<(EmissionsDoc, String), PipelineError> {
    let mut doc = EmissionsDoc {
        id: String::new(),
        model_version: model.model.version.clone(),
        model_sha256: model.sha256.to_string(),
        legs: outs.legs,
        emissions: outs.emissions,
    };
    let sha = seal(&mut doc)?;
    Ok((doc, sha))
}

pub fn build_project_report_doc(
    model: &LoadedModel,
    outs: ProjectOutputs,
    order: Option<TableOrder>,
) -> Result<(ProjectReportDoc, String), PipelineError> {
    let mut doc = ProjectReportDoc {
        id: String::new(),
        model_version: model.model.version.clone(),
        model_sha256: model.sha256.to_string(),
        project: outs.project,
        project_activities_co2: outs.project_activities_co2,
        stats: outs.stats,
        participants: outs
            .participants
            .into_iter()
            .map(|r| ParticipantRow { summary: r.summary, emissions: r.emissions })
            .collect(),
        leaderboard: outs.leaderboard.into_iter().map(LeaderboardRow::from).collect(),
        table_order: order.map(TableOrderEcho::from),
    };
    let sha = seal(&mut doc)?;
    Ok((doc, sha))
}
