//! `greendex` — offline, deterministic emissions runs.
//!
//! load → calculate → write `emissions.json` | `project_report.json` + `run_record.json`,
//! then re-hash the written report against the run record.

#![forbid(unsafe_code)]

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use args::{parse_and_validate as parse_cli, Args};
use gx_io::manifest::InputPaths;
use gx_io::{canonical_json, hasher, loader, IoError};
use gx_pipeline::{engine_identifiers, run_with_ctx, PipelineCtx, PipelineError, PipelineOutputs, TableOrder};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Manifest / JSON identity / model / expectation failures
    Validation(String),
    /// Written artifacts do not hash to what the run record claims
    SelfVerify(String),
    /// Read / write / path / size limit
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "self-verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("greendex: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(args.quiet);

    let res = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match res {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("greendex: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `RUST_LOG` wins; otherwise `warn`, or `error` under `--quiet`.
fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn load(args: &Args) -> Result<loader::LoadedContext, MainError> {
    if let Some(manifest) = &args.manifest {
        return loader::load_all_from_manifest(manifest).map_err(map_io_err);
    }
    let inputs = match (&args.answers, &args.project) {
        (Some(answers), None) => InputPaths::Participant {
            answers: answers.clone(),
            activities: args.activities.clone(),
        },
        (None, Some(bundle)) => InputPaths::Project { bundle: bundle.clone() },
        _ => return Err(MainError::Validation("exactly one of --answers or --project".into())),
    };
    loader::load_inputs(args.model.as_deref(), &inputs).map_err(map_io_err)
}

fn validate_only(args: &Args) -> Result<(), MainError> {
    let loaded = load(args)?;
    info!(
        model = %loaded.model.model.version,
        sha256 = %loaded.model.sha256,
        "validate-only: inputs OK"
    );
    if !args.quiet {
        eprintln!("validate-only: inputs OK");
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let loaded = load(args)?;
    let order = args.sort_by.map(|field| TableOrder { field, descending: args.descending });

    let ctx = PipelineCtx {
        loaded,
        engine_meta: engine_identifiers(),
        timestamp: Utc::now(),
        order,
    };
    let outs = run_with_ctx(ctx).map_err(map_pipeline_err)?;

    write_artifacts(&args.out, &outs)?;
    verify_artifacts(&args.out, &outs)?;

    if !args.quiet {
        eprintln!("run: artifacts written to {}", args.out.to_string_lossy());
    }
    Ok(())
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out_dir)
        .map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.to_string_lossy())))?;

    let report_path = out_dir.join(outs.report.file_name());
    canonical_json::write_canonical_file(&report_path, &outs.report).map_err(map_io_err)?;

    let run_path = out_dir.join("run_record.json");
    canonical_json::write_canonical_file(&run_path, &outs.run_record).map_err(map_io_err)?;
    info!(dir = %out_dir.display(), "artifacts written");
    Ok(())
}

/// The bytes on disk must hash to the run record's `result_sha256`.
fn verify_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    let report_path = out_dir.join(outs.report.file_name());
    let on_disk = hasher::sha256_file(&report_path).map_err(map_io_err)?;
    if on_disk != outs.run_record.outputs.result_sha256 {
        return Err(MainError::SelfVerify(format!(
            "{} sha256 {on_disk} != run record {}",
            report_path.display(),
            outs.run_record.outputs.result_sha256
        )));
    }
    Ok(())
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) => IO,
    }
}

fn map_io_err(e: IoError) -> MainError {
    map_pipeline_err(PipelineError::from(e))
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Validate(m) => MainError::Validation(m),
        PipelineError::Expect(m) => MainError::Validation(format!("expect: {m}")),
        PipelineError::Io(m) => MainError::Io(m),
        PipelineError::Build(m) => MainError::SelfVerify(m),
    }
}
