//! Newtypes and parsers for output/digest identifiers.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && is_lower_hex(s)
}

fn is_ts_utc_z(s: &str) -> bool {
    // Strict "YYYY-MM-DDTHH:MM:SSZ" (length 20)
    let b = s.as_bytes();
    if b.len() != 20 { return false; }
    b.iter().enumerate().all(|(i, c)| match i {
        4 | 7 => *c == b'-',
        10 => *c == b'T',
        13 | 16 => *c == b':',
        19 => *c == b'Z',
        _ => c.is_ascii_digit(),
    })
}

/// 64-hex lowercase (digest/fingerprint).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sha256(String);

impl Sha256 {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sha256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256 {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_lower_hex_len(s, 64) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidHex) }
    }
}

/// Fingerprint of the canonical `EmissionModel` JSON.
pub type ModelDigest = Sha256;

/// "GXR:" + 64-hex (lowercase)
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultId(String);

impl ResultId {
    pub const PREFIX: &'static str = "GXR:";
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResultId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(Self::PREFIX).ok_or(CoreError::InvalidId)?;
        if is_lower_hex_len(rest, 64) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidId) }
    }
}

/// "RUN:" + "<YYYY-MM-DDTHH:MM:SSZ>" + "-" + "<8..64-hex lowercase>"
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunId(String);

impl RunId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RUN:").ok_or(CoreError::InvalidId)?;
        // The timestamp has no '-' after position 10, so split at the last dash.
        let (ts, hash) = rest.rsplit_once('-').ok_or(CoreError::InvalidId)?;
        if !is_ts_utc_z(ts) { return Err(CoreError::InvalidTimestamp); }
        if !(8..=64).contains(&hash.len()) || !is_lower_hex(hash) {
            return Err(CoreError::InvalidId);
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_id_requires_prefix_and_hex64() {
        let hex = "a".repeat(64);
        assert!(format!("GXR:{hex}").parse::<ResultId>().is_ok());
        assert!(format!("RES:{hex}").parse::<ResultId>().is_err());
        assert!("GXR:ABC".parse::<ResultId>().is_err());
    }

    #[test]
    fn run_id_checks_timestamp_and_hash() {
        assert!("RUN:2026-03-01T10:00:00Z-deadbeef".parse::<RunId>().is_ok());
        assert_eq!(
            "RUN:2026-03-01 10:00:00Z-deadbeef".parse::<RunId>(),
            Err(CoreError::InvalidTimestamp)
        );
        assert_eq!("RUN:2026-03-01T10:00:00Z-xyz".parse::<RunId>(), Err(CoreError::InvalidId));
    }

    #[test]
    fn sha256_is_lowercase_only() {
        assert!("0".repeat(64).parse::<Sha256>().is_ok());
        assert!("F".repeat(64).parse::<Sha256>().is_err());
    }
}
