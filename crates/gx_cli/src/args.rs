//! CLI argument surface for `greendex`.
//!
//! - No networked paths (any `scheme://` or `http:`/`https:`/`file:` prefix is rejected)
//! - Exactly one of: `--manifest`  XOR  (`--answers` XOR `--project`)
//! - `--activities` adds a project baseline to `--answers` only
//! - `--sort-by`/`--descending` order the project participant table

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use gx_core::determinism::ParticipantField;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "greendex",
    disable_help_subcommand = true,
    about = "Offline, deterministic CO2 calculator for youth-exchange projects"
)]
pub struct Args {
    /// Path to a manifest JSON describing inputs (mutually exclusive with explicit file flags).
    #[arg(long, conflicts_with_all = ["answers", "project", "activities", "model"])]
    pub manifest: Option<PathBuf>,

    /// Participant answers JSON (participant mode).
    #[arg(long, conflicts_with = "project")]
    pub answers: Option<PathBuf>,
    /// Project activities JSON added on top of `--answers`.
    #[arg(long)]
    pub activities: Option<PathBuf>,
    /// Project bundle JSON (project mode).
    #[arg(long, conflicts_with = "answers")]
    pub project: Option<PathBuf>,
    /// Emission model JSON; the built-in model when omitted.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Output directory.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Participant table order: name | country | submittedAt | totalCO2.
    #[arg(long, value_parser = parse_sort_field)]
    pub sort_by: Option<ParticipantField>,
    /// Reverse the `--sort-by` order (missing values stay last).
    #[arg(long, requires = "sort_by")]
    pub descending: bool,

    /// Load and coerce inputs only; write nothing.
    #[arg(long)]
    pub validate_only: bool,

    /// Only log errors.
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument validation. Messages stay short and stable.
#[derive(Debug)]
pub enum CliError {
    BadCombo(&'static str),
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            BadCombo(s) => write!(f, "invalid flag combination: {s}"),
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

pub fn parse_sort_field(s: &str) -> Result<ParticipantField, String> {
    s.trim()
        .parse::<ParticipantField>()
        .map_err(|_| format!("unknown field {s:?} (expected name, country, submittedAt, totalCO2)"))
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

/// Ensure a provided path string is local (no scheme); existence is checked later.
#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.manifest.as_deref(),
        args.answers.as_deref(),
        args.activities.as_deref(),
        args.project.as_deref(),
        args.model.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

/// Entry point used by main.rs.
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Scheme checks, mode checks, existence checks, then path normalization.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    if let Some(m) = &args.manifest {
        ensure_local_exists(m, "--manifest")?;
        args.manifest = Some(normalize_path(m));
    } else {
        validate_explicit_mode(&args)?;
        args.answers = args.answers.take().map(|p| normalize_path(&p));
        args.activities = args.activities.take().map(|p| normalize_path(&p));
        args.project = args.project.take().map(|p| normalize_path(&p));
        args.model = args.model.take().map(|p| normalize_path(&p));
    }

    args.out = normalize_path(&args.out);
    Ok(args)
}

fn validate_explicit_mode(a: &Args) -> Result<(), CliError> {
    match (&a.answers, &a.project) {
        (Some(_), Some(_)) => return Err(CliError::BadCombo("--answers and --project are exclusive")),
        (None, None) => return Err(CliError::Missing("--manifest, --answers or --project")),
        _ => {}
    }
    if a.project.is_some() && a.activities.is_some() {
        return Err(CliError::BadCombo("--activities applies to --answers only"));
    }
    if a.answers.is_some() && a.sort_by.is_some() {
        return Err(CliError::BadCombo("--sort-by applies to --project only"));
    }

    for (label, p) in [
        ("--answers", &a.answers),
        ("--activities", &a.activities),
        ("--project", &a.project),
        ("--model", &a.model),
    ] {
        if let Some(p) = p {
            ensure_local_exists(p, label)?;
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Best-effort absolute path; falls back to CWD-relative when the path does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
