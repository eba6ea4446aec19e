//! gx_pipeline — deterministic orchestration (load → ingest → calculate → aggregate → rank → artifacts).
//! This crate performs no file writes; JSON, hashing and reads go through `gx_io`, math through `gx_algo`.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use gx_io::loader::{self, LoadedContext, LoadedInput};

pub mod build_result;
pub mod build_run_record;
pub mod participant;
pub mod project;

pub use build_result::{EmissionsDoc, ProjectReportDoc};
pub use build_run_record::RunRecordDoc;
pub use participant::{run_participant, ParticipantCtx, ParticipantOutputs};
pub use project::{run_project, ProjectCtx, ProjectOutputs, TableOrder};

/// Engine identifiers recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Build-time overrides via `GX_ENGINE_*`, otherwise package defaults.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: option_env!("GX_ENGINE_VENDOR").unwrap_or("greendex").to_string(),
        name: option_env!("GX_ENGINE_NAME").unwrap_or("greendex_engine").to_string(),
        version: option_env!("GX_ENGINE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")).to_string(),
        build: option_env!("GX_ENGINE_BUILD").unwrap_or("dev").to_string(),
    }
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Validate(String),
    Expect(String),
    Build(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PipelineError::*;
        match self {
            Io(m) => write!(f, "io: {m}"),
            Validate(m) => write!(f, "validate: {m}"),
            Expect(m) => write!(f, "expect: {m}"),
            Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<gx_io::IoError> for PipelineError {
    fn from(e: gx_io::IoError) -> Self {
        use gx_io::IoError as E;
        use PipelineError::*;
        match e {
            E::Read(m) => Io(format!("read: {m}")),
            E::Write(m) => Io(format!("write: {m}")),
            E::Path(m) => Io(format!("path: {m}")),
            E::Limit(m) => Io(format!("limit: {m}")),
            E::Json { pointer, msg } => Validate(format!("json {pointer}: {msg}")),
            E::Manifest(m) => Validate(format!("manifest: {m}")),
            E::Model(m) => Validate(format!("model: {m}")),
            E::Expect(m) => Expect(m),
            E::Canon(m) => Build(format!("canon: {m}")),
            E::Hash(m) => Build(format!("hash: {m}")),
        }
    }
}

/// Pipeline context: inputs are already loaded and coerced by gx_io.
#[derive(Debug)]
pub struct PipelineCtx {
    pub loaded: LoadedContext,
    pub engine_meta: EngineMeta,
    /// Run timestamp; supplied by the caller so runs can be replayed.
    pub timestamp: DateTime<Utc>,
    /// Participant table order (project mode only).
    pub order: Option<TableOrder>,
}

/// The per-mode result artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDoc {
    Emissions(EmissionsDoc),
    Project(ProjectReportDoc),
}

impl ReportDoc {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportDoc::Emissions(_) => "emissions.json",
            ReportDoc::Project(_) => "project_report.json",
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            ReportDoc::Emissions(_) => "participant",
            ReportDoc::Project(_) => "project",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ReportDoc::Emissions(d) => &d.id,
            ReportDoc::Project(d) => &d.id,
        }
    }
}

impl Serialize for ReportDoc {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ReportDoc::Emissions(d) => d.serialize(s),
            ReportDoc::Project(d) => d.serialize(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutputs {
    pub report: ReportDoc,
    pub run_record: RunRecordDoc,
}

// -------------------------------------- Public API --------------------------------------

/// Orchestrate one run over a preloaded context.
pub fn run_with_ctx(ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    let PipelineCtx { loaded, engine_meta, timestamp, order } = ctx;
    let model = &loaded.model;
    info!(version = %model.model.version, sha256 = %model.sha256, "model ready");

    let (report, result_sha) = match &loaded.input {
        LoadedInput::Participant { answers, activities } => {
            let outs = run_participant(&ParticipantCtx {
                model: &model.model,
                answers,
                activities,
            });
            info!(legs = outs.legs.len(), total_co2 = outs.emissions.total_co2, "participant calculated");
            let (doc, sha) = build_result::build_emissions_doc(model, outs)?;
            (ReportDoc::Emissions(doc), sha)
        }
        LoadedInput::Project(bundle) => {
            let outs = run_project(&ProjectCtx { model: &model.model, bundle, order });
            info!(
                project = %outs.project.id,
                participants = outs.stats.total_participants,
                total_co2 = outs.stats.total_co2,
                "project aggregated"
            );
            let (doc, sha) = build_result::build_project_report_doc(model, outs, order)?;
            (ReportDoc::Project(doc), sha)
        }
    };

    let outputs = build_run_record::RunOutputs {
        result_id: report.id().to_string(),
        result_sha256: result_sha,
        artifact: report.file_name().to_string(),
    };
    let run_record = build_run_record::build_run_record(
        timestamp,
        &engine_meta,
        report.mode(),
        model,
        &loaded.digests,
        outputs,
    )?;
    info!(result = %report.id(), run = %run_record.id, "artifacts built");

    Ok(PipelineOutputs { report, run_record })
}

/// Convenience entry: load a manifest via gx_io, then run with the current clock.
pub fn run_from_manifest_path<P: AsRef<Path>>(
    path: P,
    order: Option<TableOrder>,
) -> Result<PipelineOutputs, PipelineError> {
    let loaded = loader::load_all_from_manifest(path.as_ref())?;
    run_with_ctx(PipelineCtx {
        loaded,
        engine_meta: engine_identifiers(),
        timestamp: Utc::now(),
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use chrono::TimeZone;
    use gx_core::determinism::ParticipantField;
    use gx_io::manifest::InputPaths;
    use serde_json::json;
    use std::fs;

    fn fixed_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ctx(loaded: LoadedContext, order: Option<TableOrder>) -> PipelineCtx {
        PipelineCtx { loaded, engine_meta: engine_identifiers(), timestamp: fixed_ts(), order }
    }

    #[test]
    fn participant_run_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let answers = dir.path().join("answers.json");
        fs::write(&answers, r#"{"trainKm": 500, "days": 3, "food": "sometimes"}"#).unwrap();
        let inputs = InputPaths::Participant { answers, activities: None };

        let a = run_with_ctx(ctx(loader::load_inputs(None, &inputs).unwrap(), None)).unwrap();
        let b = run_with_ctx(ctx(loader::load_inputs(None, &inputs).unwrap(), None)).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.report.file_name(), "emissions.json");
        assert_eq!(a.run_record.outputs.result_id, a.report.id());
        assert_eq!(a.run_record.mode, "participant");
        assert!(a.run_record.id.starts_with("RUN:2026-03-01T12:00:00Z-"));
        assert!(a.run_record.inputs.answers_sha256.is_some());
        assert_eq!(a.run_record.inputs.project_sha256, None);
    }

    #[test]
    fn project_report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("project.json");
        let body = json!({
            "project": {"id": "camp-2026", "name": "Camp", "startDate": "2026-07-01"},
            "activities": [{"activityType": "bus", "distanceKm": 50}],
            "participants": [
                {"id": "p1", "name": "Ana", "answers": {"flightKm": 900}},
                {"id": "p2", "name": "Ben", "answers": {"trainKm": 300}},
                {"id": "p3", "name": "Cy"}
            ]
        });
        fs::write(&bundle, body.to_string()).unwrap();
        let inputs = InputPaths::Project { bundle };
        let order = TableOrder { field: ParticipantField::TotalCo2, descending: true };

        let out = run_with_ctx(ctx(loader::load_inputs(None, &inputs).unwrap(), Some(order))).unwrap();
        assert_eq!(out.report.file_name(), "project_report.json");
        assert_eq!(out.run_record.mode, "project");

        let v = serde_json::to_value(&out.report).unwrap();
        assert_json_include!(
            actual: v.clone(),
            expected: json!({
                "project": {"id": "camp-2026", "participantCount": 3},
                "stats": {"totalParticipants": 3},
                "participants": [{"id": "p1"}, {"id": "p2"}, {"id": "p3"}],
                "leaderboard": [
                    {"rank": 1, "participantId": "p2"},
                    {"rank": 2, "participantId": "p1"},
                    {"rank": null, "participantId": "p3"}
                ],
                "table_order": {"field": "totalCO2", "descending": true}
            })
        );
        assert!(v["id"].as_str().unwrap().starts_with("GXR:"));
    }

    #[test]
    fn expectation_mismatch_maps_to_expect() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("answers.json"), "{}").unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"{"answers_path":"answers.json","expect":{"model_version":"greendex-v9"}}"#,
        )
        .unwrap();
        let err = run_from_manifest_path(&manifest, None).unwrap_err();
        assert!(matches!(err, PipelineError::Expect(_)), "{err}");
    }

    #[test]
    fn io_errors_map_to_buckets() {
        let e: PipelineError = gx_io::IoError::Limit("big".into()).into();
        assert!(matches!(e, PipelineError::Io(_)));
        let e: PipelineError = gx_io::IoError::Model("bad".into()).into();
        assert!(matches!(e, PipelineError::Validate(_)));
        let e: PipelineError = gx_io::IoError::Hash("x".into()).into();
        assert!(matches!(e, PipelineError::Build(_)));
    }
}
