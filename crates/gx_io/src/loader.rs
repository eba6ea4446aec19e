//! Loader: read local JSON inputs (manifest → model → answers / project bundle),
//! coerce them through `ingest`, fingerprint them, and return a typed
//! `LoadedContext` for the pipeline. No network I/O.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use gx_core::ids::ModelDigest;
use gx_core::{
    ActivityRecord, EmissionModel, ParticipantAnswers, ParticipantId, ProjectActivityType, ProjectId,
};

use crate::ingest::{ingest_activities, ingest_answers, raw_activities_from_value};
use crate::manifest::{self as man, InputPaths};
use crate::{hasher, IoError};

/// Upper bound on any single input file.
pub const MAX_INPUT_BYTES: u64 = 8 * 1024 * 1024;

// ----------------------------- Loaded types -----------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Builtin,
    File(PathBuf),
}

/// A validated model plus its fingerprint.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: EmissionModel,
    pub sha256: ModelDigest,
    pub source: ModelSource,
}

/// Project header from a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One participant of a project; `answers` is `None` until they submit.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEntry {
    pub id: ParticipantId,
    pub name: String,
    pub country: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub answers: Option<ParticipantAnswers>,
}

/// `{ "project": {...}, "activities": [...], "participants": [...] }`
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectBundle {
    pub project: ProjectInfo,
    pub activities: Vec<ActivityRecord<ProjectActivityType>>,
    pub participants: Vec<ParticipantEntry>,
}

#[derive(Debug, Clone)]
pub enum LoadedInput {
    Participant {
        answers: ParticipantAnswers,
        activities: Vec<ActivityRecord<ProjectActivityType>>,
    },
    Project(ProjectBundle),
}

/// SHA-256 of each input's canonical JSON (model: of the validated model).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigests {
    pub model_sha256: String,
    pub answers_sha256: Option<String>,
    pub activities_sha256: Option<String>,
    pub project_sha256: Option<String>,
}

/// Everything the pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct LoadedContext {
    pub model: LoadedModel,
    pub input: LoadedInput,
    pub digests: InputDigests,
}

// ----------------------------- Orchestration -----------------------------

/// Load everything named by a manifest file and enforce its `expect` pins.
pub fn load_all_from_manifest(path: &Path) -> Result<LoadedContext, IoError> {
    let resolved = man::load_and_resolve_manifest(path)?;
    let ctx = load_inputs(resolved.model_path.as_deref(), &resolved.inputs)?;
    man::enforce_expectations(
        resolved.expect.as_ref(),
        &ctx.model.model.version,
        ctx.model.sha256.as_str(),
    )?;
    Ok(ctx)
}

/// Load a model (built-in when `model_path` is `None`) and the mode's inputs.
pub fn load_inputs(model_path: Option<&Path>, inputs: &InputPaths) -> Result<LoadedContext, IoError> {
    let model = match model_path {
        Some(p) => load_model(p)?,
        None => builtin_model()?,
    };
    let mut digests = InputDigests {
        model_sha256: model.sha256.to_string(),
        ..InputDigests::default()
    };

    let input = match inputs {
        InputPaths::Participant { answers, activities } => {
            let v = read_json_value_with_limits(answers)?;
            digests.answers_sha256 = Some(hasher::sha256_canonical(&v)?);
            let answers = ingest_answers(&v);

            let activities = match activities {
                Some(p) => {
                    let v = read_json_value_with_limits(p)?;
                    digests.activities_sha256 = Some(hasher::sha256_canonical(&v)?);
                    ingest_activities(&raw_activities_from_value(&v))
                }
                None => Vec::new(),
            };
            LoadedInput::Participant { answers, activities }
        }
        InputPaths::Project { bundle } => {
            let v = read_json_value_with_limits(bundle)?;
            digests.project_sha256 = Some(hasher::sha256_canonical(&v)?);
            LoadedInput::Project(project_bundle_from_value(&v)?)
        }
    };

    Ok(LoadedContext { model, input, digests })
}

// ----------------------------- Targeted loaders -----------------------------

/// The built-in v1 model, fingerprinted like a file-backed one.
pub fn builtin_model() -> Result<LoadedModel, IoError> {
    let model = EmissionModel::v1();
    let sha256 = hasher::model_digest(&model)?;
    Ok(LoadedModel { model, sha256, source: ModelSource::Builtin })
}

/// Parse and validate an external model file.
pub fn load_model(path: &Path) -> Result<LoadedModel, IoError> {
    let v = read_json_value_with_limits(path)?;
    let model: EmissionModel = serde_json::from_value(v)
        .map_err(|e| IoError::Model(format!("{}: {e}", path.display())))?;
    model
        .validate()
        .map_err(|e| IoError::Model(format!("{}: {e}", path.display())))?;
    let sha256 = hasher::model_digest(&model)?;
    debug!(version = %model.version, sha256 = %sha256, "loaded emission model");
    Ok(LoadedModel { model, sha256, source: ModelSource::File(path.to_path_buf()) })
}

/// Build a bundle from parsed JSON. Activity rows and answers are coerced
/// leniently; project and participant identity must be valid.
pub fn project_bundle_from_value(v: &Value) -> Result<ProjectBundle, IoError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawProject {
        id: String,
        name: String,
        #[serde(default)]
        location: Option<String>,
        #[serde(default)]
        start_date: Value,
        #[serde(default)]
        end_date: Value,
        #[serde(default)]
        created_at: Value,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawParticipant {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        submitted_at: Value,
        #[serde(default)]
        answers: Value,
    }

    let obj = v.as_object().ok_or_else(|| json_err("/", "project bundle must be an object"))?;

    let raw_project: RawProject = match obj.get("project") {
        Some(p) => RawProject::deserialize(p).map_err(|e| json_err("/project", e))?,
        None => return Err(json_err("/project", "missing")),
    };
    let project = ProjectInfo {
        id: raw_project
            .id
            .parse()
            .map_err(|e| json_err("/project/id", format!("{e}: {}", raw_project.id)))?,
        name: raw_project.name,
        location: raw_project.location,
        start_date: timestamp_field("startDate", &raw_project.start_date),
        end_date: timestamp_field("endDate", &raw_project.end_date),
        created_at: timestamp_field("createdAt", &raw_project.created_at),
    };

    let activities = obj
        .get("activities")
        .map(|a| ingest_activities(&raw_activities_from_value(a)))
        .unwrap_or_default();

    let raw_participants: &[Value] = match obj.get("participants") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => return Err(json_err("/participants", "must be an array")),
    };

    let mut seen = BTreeSet::new();
    let mut participants = Vec::with_capacity(raw_participants.len());
    for (i, item) in raw_participants.iter().enumerate() {
        let pointer = format!("/participants/{i}");
        let rp = RawParticipant::deserialize(item).map_err(|e| json_err(&pointer, e))?;
        let id: ParticipantId = rp
            .id
            .parse()
            .map_err(|e| json_err(&format!("{pointer}/id"), format!("{e}: {}", rp.id)))?;
        if !seen.insert(id.clone()) {
            return Err(json_err(&format!("{pointer}/id"), format!("duplicate participant id {id}")));
        }
        let answers = match &rp.answers {
            Value::Null => None,
            a => Some(ingest_answers(a)),
        };
        participants.push(ParticipantEntry {
            id,
            name: rp.name,
            country: rp.country,
            submitted_at: timestamp_field("submittedAt", &rp.submitted_at),
            answers,
        });
    }

    Ok(ProjectBundle { project, activities, participants })
}

// ----------------------------- Low-level helpers -----------------------------

/// Read a JSON file, refusing anything over `MAX_INPUT_BYTES`.
pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let f = File::open(path).map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!(
            "{} exceeds {MAX_INPUT_BYTES} bytes",
            path.display()
        )));
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}

fn json_err(pointer: &str, msg: impl std::fmt::Display) -> IoError {
    IoError::Json { pointer: pointer.to_string(), msg: msg.to_string() }
}

/// RFC 3339, or a bare `YYYY-MM-DD` (midnight UTC). Anything else is dropped.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

fn timestamp_field(field: &'static str, v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Null => None,
        Value::String(s) => {
            let ts = parse_timestamp(s);
            if ts.is_none() {
                warn!(field, value = %s, "ignoring unparseable timestamp");
            }
            ts
        }
        _ => {
            warn!(field, "ignoring non-string timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gx_core::{CarType, FoodFrequency};
    use serde_json::json;
    use std::fs;

    fn write(dir: &Path, name: &str, v: &Value) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, serde_json::to_vec_pretty(v).unwrap()).unwrap();
        p
    }

    fn bundle_json() -> Value {
        json!({
            "project": {
                "id": "youth-exchange-lisbon",
                "name": "Youth Exchange Lisbon",
                "location": "Lisbon",
                "startDate": "2026-05-04",
                "endDate": "2026-05-11T18:00:00+02:00",
                "createdAt": "last tuesday"
            },
            "activities": [
                {"activityType": "bus", "distanceKm": "40"},
                {"activityType": "plane", "distanceKm": 500}
            ],
            "participants": [
                {"id": "p1", "name": "Ana", "country": "PT",
                 "submittedAt": "2026-04-01T10:00:00Z",
                 "answers": {"trainKm": 300, "carType": "car", "food": "never"}},
                {"id": "p2", "name": "Ben"}
            ]
        })
    }

    #[test]
    fn file_model_matches_builtin_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "model.json", &serde_json::to_value(EmissionModel::v1()).unwrap());
        let loaded = load_model(&p).unwrap();
        assert_eq!(loaded.sha256, builtin_model().unwrap().sha256);
        assert_eq!(loaded.source, ModelSource::File(p));
    }

    #[test]
    fn invalid_model_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = serde_json::to_value(EmissionModel::v1()).unwrap();
        v["transport"]["plane"] = json!(-1.0);
        let p = write(dir.path(), "model.json", &v);
        assert!(matches!(load_model(&p), Err(IoError::Model(_))));

        let p = write(dir.path(), "extra.json", &json!({"version": "x", "surprise": 1}));
        assert!(matches!(load_model(&p), Err(IoError::Model(_))));
    }

    #[test]
    fn oversized_input_hits_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("huge.json");
        let big = format!("\"{}\"", "x".repeat(MAX_INPUT_BYTES as usize));
        fs::write(&p, big).unwrap();
        assert!(matches!(read_json_value_with_limits(&p), Err(IoError::Limit(_))));
    }

    #[test]
    fn project_bundle_is_coerced() {
        let b = project_bundle_from_value(&bundle_json()).unwrap();
        assert_eq!(b.project.id.as_str(), "youth-exchange-lisbon");
        assert_eq!(b.project.start_date, Some(Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap()));
        assert_eq!(b.project.end_date, Some(Utc.with_ymd_and_hms(2026, 5, 11, 16, 0, 0).unwrap()));
        assert_eq!(b.project.created_at, None);

        // "plane" is not a project activity type.
        assert_eq!(b.activities, vec![ActivityRecord::new(ProjectActivityType::Bus, 40.0)]);

        assert_eq!(b.participants.len(), 2);
        let ana = &b.participants[0].answers.as_ref().unwrap();
        assert_eq!(ana.train_km, Some(300.0));
        assert_eq!(ana.car_type, Some(CarType::Conventional));
        assert_eq!(ana.food, Some(FoodFrequency::Never));
        assert_eq!(b.participants[1].answers, None);
    }

    #[test]
    fn bad_identity_fails_with_pointer() {
        let mut v = bundle_json();
        v["participants"][1]["id"] = json!("has space");
        match project_bundle_from_value(&v) {
            Err(IoError::Json { pointer, .. }) => assert_eq!(pointer, "/participants/1/id"),
            other => panic!("expected json error, got {other:?}"),
        }

        let mut v = bundle_json();
        v["participants"][1]["id"] = json!("p1");
        assert!(project_bundle_from_value(&v).is_err());
    }

    #[test]
    fn manifest_run_loads_and_enforces_expectations() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "answers.json", &json!({"flightKm": 1000}));
        write(dir.path(), "baseline.json", &json!([{"activityType": "train", "distanceKm": 10}]));
        let sha = builtin_model().unwrap().sha256.to_string();
        let m = write(
            dir.path(),
            "manifest.json",
            &json!({
                "answers_path": "answers.json",
                "activities_path": "baseline.json",
                "expect": {"model_version": "greendex-v1", "model_sha256": sha}
            }),
        );
        let ctx = load_all_from_manifest(&m).unwrap();
        assert_eq!(ctx.digests.model_sha256, sha);
        assert!(ctx.digests.answers_sha256.is_some());
        assert!(ctx.digests.activities_sha256.is_some());
        assert_eq!(ctx.digests.project_sha256, None);
        match ctx.input {
            LoadedInput::Participant { answers, activities } => {
                assert_eq!(answers.flight_km, Some(1000.0));
                assert_eq!(activities.len(), 1);
            }
            LoadedInput::Project(_) => panic!("expected participant mode"),
        }

        let m = write(
            dir.path(),
            "pinned.json",
            &json!({"answers_path": "answers.json", "expect": {"model_version": "greendex-v0"}}),
        );
        assert!(matches!(load_all_from_manifest(&m), Err(IoError::Expect(_))));
    }

    #[test]
    fn timestamps_accept_rfc3339_and_dates() {
        assert!(parse_timestamp("2026-01-02T03:04:05Z").is_some());
        assert!(parse_timestamp("2026-01-02").is_some());
        assert!(parse_timestamp("02/01/2026").is_none());
    }
}
