//! build_run_record.rs — provenance record for one engine run.
//!
//! `RUN:<timestamp>-<hex16>` where the hex is the SHA-256 prefix of the canonical
//! record with its `id` omitted. The record echoes the engine identity, the
//! model fingerprint, every input digest and the produced artifact.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use gx_io::hasher;
use gx_io::loader::{InputDigests, LoadedModel, ModelSource};

use crate::{EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub timestamp_utc: String,
    pub engine: EngineMeta,
    /// "participant" | "project"
    pub mode: String,
    pub model: RunModel,
    pub inputs: InputDigests,
    pub outputs: RunOutputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunModel {
    pub version: String,
    pub sha256: String,
    /// "builtin" or the model file path.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutputs {
    pub result_id: String,
    pub result_sha256: String,
    pub artifact: String,
}

/// Second precision with a trailing `Z`, as run ids require.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<&LoadedModel> for RunModel {
    fn from(m: &LoadedModel) -> Self {
        let source = match &m.source {
            ModelSource::Builtin => "builtin".to_string(),
            ModelSource::File(p) => p.display().to_string(),
        };
        Self { version: m.model.version.clone(), sha256: m.sha256.to_string(), source }
    }
}

pub fn build_run_record(
    timestamp: DateTime<Utc>,
    engine: &EngineMeta,
    mode: &str,
    model: &LoadedModel,
    inputs: &InputDigests,
    outputs: RunOutputs,
) -> Result<RunRecordDoc, PipelineError> {
    let timestamp_utc = format_timestamp(timestamp);
    let mut doc = RunRecordDoc {
        id: String::new(),
        timestamp_utc,
        engine: engine.clone(),
        mode: mode.to_string(),
        model: RunModel::from(model),
        inputs: inputs.clone(),
        outputs,
    };
    let id = hasher::run_id_from_canonical(&doc.timestamp_utc, &doc)?;
    doc.id = id.to_string();
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> EngineMeta {
        EngineMeta {
            vendor: "test".into(),
            name: "greendex".into(),
            version: "0.0.0".into(),
            build: "unit".into(),
        }
    }

    fn outputs() -> RunOutputs {
        RunOutputs {
            result_id: format!("GXR:{}", "a".repeat(64)),
            result_sha256: "b".repeat(64),
            artifact: "emissions.json".into(),
        }
    }

    #[test]
    fn run_id_embeds_timestamp_and_is_stable() {
        let model = gx_io::loader::builtin_model().unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let digests = InputDigests { model_sha256: model.sha256.to_string(), ..InputDigests::default() };

        let a = build_run_record(ts, &engine(), "participant", &model, &digests, outputs()).unwrap();
        let b = build_run_record(ts, &engine(), "participant", &model, &digests, outputs()).unwrap();

        assert_eq!(a.timestamp_utc, "2026-03-01T10:00:00Z");
        assert!(a.id.starts_with("RUN:2026-03-01T10:00:00Z-"));
        assert_eq!(a.id, b.id);
        assert_eq!(a.model.source, "builtin");

        let c = build_run_record(ts, &engine(), "project", &model, &digests, outputs()).unwrap();
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn id_hex_has_fixed_length() {
        let model = gx_io::loader::builtin_model().unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let doc = build_run_record(ts, &engine(), "participant", &model, &InputDigests::default(), outputs())
            .unwrap();
        let (_, hex) = doc.id.rsplit_once('-').unwrap();
        assert_eq!(hex.len(), hasher::RUN_ID_HEX_LEN);
    }
}
