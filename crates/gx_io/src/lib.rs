//! gx_io — everything between the filesystem and the typed calculators.
//!
//! - `ingest`: loosely typed JSON rows → typed records (bad rows dropped, never fatal)
//! - `loader`: size-limited reads of model / answers / project bundle files
//! - `manifest`: offline-only run manifest, resolved relative to its own directory
//! - `canonical_json` + `hasher`: sorted-key bytes, SHA-256 digests, `GXR:`/`RUN:` ids
//!
//! Shared error type (`IoError`) with `From` conversions used across modules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for gx_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Reading an input file failed.
    #[error("read error: {0}")]
    Read(String),

    /// Writing an artifact failed.
    #[error("write error: {0}")]
    Write(String),

    /// JSON parse/shape errors with a JSON Pointer-ish location.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Manifest shape, offline policy, or path resolution.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Emission model file failed to parse or validate.
    #[error("model error: {0}")]
    Model(String),

    /// Manifest expectations (model version / digest) not met.
    #[error("expectation mismatch: {0}")]
    Expect(String),

    #[error("canonicalization error: {0}")]
    Canon(String),

    #[error("hash error: {0}")]
    Hash(String),

    /// Filesystem / path errors (create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// Input exceeded `loader::MAX_INPUT_BYTES`.
    #[error("input too large: {0}")]
    Limit(String),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps no pointer; callers enrich this where they know one.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod ingest;
pub mod loader;
pub mod manifest;

/// Returns true if `s` looks like a URL (any `<scheme>://`, plus bare `http:`/`https:`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}
