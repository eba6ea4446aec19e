//! Run manifest: which local files make up one engine run.
//!
//! Shape:
//! ```json
//! { "model_path": "model.json",          // optional, built-in v1 when absent
//!   "answers_path": "answers.json",       // participant mode ...
//!   "activities_path": "baseline.json",   // ... with an optional project baseline
//!   "project_path": "project.json",       // OR project mode
//!   "expect": { "model_version": "greendex-v1", "model_sha256": "<64 hex>" } }
//! ```
//!
//! Rules:
//! - Exactly one of `answers_path` / `project_path`; `activities_path` only with answers.
//! - Offline-only: any path with a URL scheme is rejected.
//! - Relative paths resolve against the manifest's directory; inputs must be files.
//! - `expect` entries are checked once the model has been loaded and fingerprinted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{looks_like_url_strict, IoError};

/// External manifest accepted by the loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub answers_path: Option<String>,
    #[serde(default)]
    pub activities_path: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub expect: Option<Expectations>,
}

/// Optional pins on the model a run must use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    #[serde(default)]
    pub model_version: Option<String>,
    /// Lowercase 64-hex fingerprint of the canonical model JSON.
    #[serde(default)]
    pub model_sha256: Option<String>,
}

/// The input files of one run, by mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPaths {
    Participant { answers: PathBuf, activities: Option<PathBuf> },
    Project { bundle: PathBuf },
}

/// Paths resolved against the manifest's directory.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub model_path: Option<PathBuf>,
    pub inputs: InputPaths,
    pub expect: Option<Expectations>,
}

// ---------- helpers ----------

#[inline]
fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

fn check_path_field(label: &str, value: Option<&String>) -> Result<(), IoError> {
    let Some(s) = value else { return Ok(()) };
    if s.trim().is_empty() {
        return Err(IoError::Manifest(format!("{label} must not be empty")));
    }
    if looks_like_url_strict(s) {
        return Err(IoError::Manifest(format!("{label} must be a local path (no URL scheme): {s}")));
    }
    Ok(())
}

fn must_exist_file(label: &str, p: &Path) -> Result<(), IoError> {
    let md = fs::metadata(p).map_err(|e| IoError::Manifest(format!("{label}: {} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(IoError::Manifest(format!("{label} is not a file: {}", p.display())));
    }
    Ok(())
}

// ---------- validation ----------

/// Shape + offline policy. Performs no I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), IoError> {
    check_path_field("model_path", man.model_path.as_ref())?;
    check_path_field("answers_path", man.answers_path.as_ref())?;
    check_path_field("activities_path", man.activities_path.as_ref())?;
    check_path_field("project_path", man.project_path.as_ref())?;

    match (&man.answers_path, &man.project_path) {
        (Some(_), Some(_)) => {
            return Err(IoError::Manifest("answers_path and project_path are mutually exclusive".into()))
        }
        (None, None) => {
            return Err(IoError::Manifest("one of answers_path or project_path is required".into()))
        }
        _ => {}
    }
    if man.project_path.is_some() && man.activities_path.is_some() {
        return Err(IoError::Manifest(
            "activities_path applies to answers_path only; project files carry their own activities".into(),
        ));
    }

    if let Some(exp) = &man.expect {
        if let Some(h) = &exp.model_sha256 {
            if !is_lower_hex_64(h) {
                return Err(IoError::Manifest(format!("expect.model_sha256 must be 64 lowercase hex: {h}")));
            }
        }
        if let Some(v) = &exp.model_version {
            if v.trim().is_empty() {
                return Err(IoError::Manifest("expect.model_version must not be empty".into()));
            }
        }
    }
    Ok(())
}

/// Resolve and existence-check every path under `base_dir`.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, IoError> {
    let model_path = man.model_path.as_deref().map(|s| join_under(base_dir, s));
    if let Some(p) = &model_path {
        must_exist_file("model_path", p)?;
    }

    let inputs = match (&man.answers_path, &man.project_path) {
        (Some(a), None) => {
            let answers = join_under(base_dir, a);
            must_exist_file("answers_path", &answers)?;
            let activities = man.activities_path.as_deref().map(|s| join_under(base_dir, s));
            if let Some(p) = &activities {
                must_exist_file("activities_path", p)?;
            }
            InputPaths::Participant { answers, activities }
        }
        (None, Some(p)) => {
            let bundle = join_under(base_dir, p);
            must_exist_file("project_path", &bundle)?;
            InputPaths::Project { bundle }
        }
        _ => return Err(IoError::Manifest("one of answers_path or project_path is required".into())),
    };

    Ok(ResolvedManifest { model_path, inputs, expect: man.expect.clone() })
}

/// Check `expect` pins against the model actually loaded.
pub fn enforce_expectations(
    expect: Option<&Expectations>,
    actual_model_version: &str,
    actual_model_sha256: &str,
) -> Result<(), IoError> {
    let Some(exp) = expect else { return Ok(()) };

    if let Some(want) = &exp.model_version {
        if want != actual_model_version {
            return Err(IoError::Expect(format!(
                "model_version expected={want} got={actual_model_version}"
            )));
        }
    }
    if let Some(want) = &exp.model_sha256 {
        if want != actual_model_sha256 {
            return Err(IoError::Expect(format!(
                "model_sha256 expected={want} got={actual_model_sha256}"
            )));
        }
    }
    Ok(())
}

/// Read, validate, and resolve a manifest file.
pub fn load_and_resolve_manifest(manifest_path: &Path) -> Result<ResolvedManifest, IoError> {
    let v = crate::loader::read_json_value_with_limits(manifest_path)?;
    let man: Manifest = serde_json::from_value(v).map_err(|e| IoError::Manifest(format!(
        "{}: {e}",
        manifest_path.display()
    )))?;
    validate_manifest(&man)?;

    let base = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    resolve_paths(&base, &man)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn man() -> Manifest {
        Manifest { answers_path: Some("answers.json".into()), ..Manifest::default() }
    }

    #[test]
    fn exactly_one_input_mode() {
        assert!(validate_manifest(&man()).is_ok());
        assert!(validate_manifest(&Manifest::default()).is_err());

        let both = Manifest { project_path: Some("p.json".into()), ..man() };
        assert!(validate_manifest(&both).is_err());

        let project_with_baseline = Manifest {
            answers_path: None,
            project_path: Some("p.json".into()),
            activities_path: Some("a.json".into()),
            ..Manifest::default()
        };
        assert!(validate_manifest(&project_with_baseline).is_err());
    }

    #[test]
    fn urls_are_rejected() {
        let m = Manifest { model_path: Some("https://example.org/model.json".into()), ..man() };
        let err = validate_manifest(&m).unwrap_err();
        assert!(err.to_string().contains("model_path"));
    }

    #[test]
    fn expectation_hex_shape_is_checked() {
        let m = Manifest {
            expect: Some(Expectations { model_version: None, model_sha256: Some("ABC".into()) }),
            ..man()
        };
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let r: Result<Manifest, _> = serde_json::from_str(r#"{"answers_path":"a.json","participants_path":"x"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn resolves_relative_to_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("answers.json"), "{}").unwrap();
        fs::write(dir.path().join("baseline.json"), "[]").unwrap();
        let mpath = dir.path().join("run.json");
        fs::write(&mpath, r#"{"answers_path":"answers.json","activities_path":"baseline.json"}"#).unwrap();

        let r = load_and_resolve_manifest(&mpath).unwrap();
        assert_eq!(r.model_path, None);
        assert_eq!(
            r.inputs,
            InputPaths::Participant {
                answers: dir.path().join("answers.json"),
                activities: Some(dir.path().join("baseline.json")),
            }
        );
    }

    #[test]
    fn missing_input_file_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_paths(dir.path(), &man()).is_err());
    }

    #[test]
    fn expectations_compare_exactly() {
        let hex = "0".repeat(64);
        let exp = Expectations { model_version: Some("greendex-v1".into()), model_sha256: Some(hex.clone()) };
        assert!(enforce_expectations(Some(&exp), "greendex-v1", &hex).is_ok());
        assert!(matches!(
            enforce_expectations(Some(&exp), "greendex-v2", &hex),
            Err(IoError::Expect(_))
        ));
        assert!(enforce_expectations(None, "anything", "x").is_ok());
    }
}
