//! Deterministic hashing and id builders for canonical artifacts.
//!
//! - Canonical JSON hashing: UTF-8, sorted object keys, array order preserved.
//! - `GXR:<hex>` ids derive from the canonical bytes of a result payload
//!   (without its own `id` field); `RUN:<ts>-<hex>` adds a UTC timestamp.
//! - Hex digests are lowercase.
//!
//! Use `sha256_canonical(..)` for values/structs and `sha256_hex(..)` /
//! `sha256_file(..)` for raw bytes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256 as Sha256Hasher};

use gx_core::ids::{ModelDigest, ResultId, RunId, Sha256};
use gx_core::EmissionModel;

use crate::canonical_json::to_canonical_bytes;
use crate::IoError;

/// Hex chars of the run payload digest kept in a `RUN:` id.
pub const RUN_ID_HEX_LEN: usize = 16;

/* ------------------------------- Raw hashing ------------------------------- */

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256Hasher::digest(bytes))
}

/// SHA-256 over a file's raw bytes (streamed).
pub fn sha256_file(path: &Path) -> Result<String, IoError> {
    let f = File::open(path).map_err(|e| IoError::Read(format!("{}: {e}", path.display())))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256Hasher::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf).map_err(|e| IoError::Hash(e.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/* ---------------------------- Canonical hashing ---------------------------- */

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, IoError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Fingerprint of an emission model: SHA-256 of its canonical JSON.
///
/// Two models with the same constants hash the same regardless of the
/// key order or whitespace of the file they came from.
pub fn model_digest(model: &EmissionModel) -> Result<ModelDigest, IoError> {
    let hex = sha256_canonical(model)?;
    hex.parse::<Sha256>().map_err(|e| IoError::Hash(e.to_string()))
}

/* ---------------------------- Artifact id builders ---------------------------- */

/// `GXR:<hex>` over the canonical bytes of `payload`.
pub fn result_id_from_canonical<T: Serialize + ?Sized>(payload: &T) -> Result<ResultId, IoError> {
    let hex = sha256_canonical(payload)?;
    format!("{}{hex}", ResultId::PREFIX)
        .parse::<ResultId>()
        .map_err(|e| IoError::Hash(e.to_string()))
}

/// `RUN:<YYYY-MM-DDTHH:MM:SSZ>-<hex16>`.
///
/// `timestamp_utc` must already be second-precision UTC with a trailing `Z`.
pub fn run_id_from_canonical<T: Serialize + ?Sized>(
    timestamp_utc: &str,
    payload: &T,
) -> Result<RunId, IoError> {
    let hex = sha256_canonical(payload)?;
    format!("RUN:{timestamp_utc}-{}", &hex[..RUN_ID_HEX_LEN])
        .parse::<RunId>()
        .map_err(|e| IoError::Hash(format!("{e}: {timestamp_utc}")))
}
