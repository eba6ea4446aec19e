//! gx_core — Core types, closed category sets, the versioned emission model,
//! and deterministic ordering helpers.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`gx_io`, `gx_algo`, `gx_pipeline`, `gx_cli`).
//!
//! - Closed category enums: `ActivityType`, `ProjectActivityType`, accommodation,
//!   occupancy, electricity, food, car type
//! - `EmissionModel`: every calibration constant in one immutable value
//! - Entities: activity records, questionnaire answers, calculation outputs
//! - Output IDs: `GXR:`, `RUN:`; registry tokens: `ProjectId`, `ParticipantId`
//! - Comparator factory for project/participant lists
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId,
        InvalidToken,
        InvalidHex,
        InvalidTimestamp,
        /// A wire token did not name any member of the closed set.
        UnknownToken(&'static str),
        /// A calibration constant failed its domain check (name of the constant).
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId => write!(f, "invalid id"),
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::InvalidHex => write!(f, "invalid hex"),
                CoreError::InvalidTimestamp => write!(f, "invalid timestamp"),
                CoreError::UnknownToken(set) => write!(f, "unknown {set} token"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod tokens {
    //! Registry token types (`ProjectId`, `ParticipantId`) with strict charset.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    pub(crate) fn is_token(s: &str) -> bool {
        let len = s.len();
        if !(1..=64).contains(&len) { return false; }
        s.bytes().all(|b| matches!(b,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
            b'_' | b'-' | b':' | b'.'
        ))
    }

    macro_rules! def_token {
        ($name:ident) => {
            #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
            #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
            #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
            pub struct $name(String);

            impl $name {
                pub fn as_str(&self) -> &str { &self.0 }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
            }

            impl FromStr for $name {
                type Err = CoreError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    if is_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken) }
                }
            }

            impl TryFrom<String> for $name {
                type Error = CoreError;
                fn try_from(s: String) -> Result<Self, Self::Error> {
                    if is_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken) }
                }
            }

            impl From<$name> for String {
                fn from(t: $name) -> String { t.0 }
            }
        }
    }

    def_token!(ProjectId);
    def_token!(ParticipantId);
}

pub mod categories;
pub mod determinism;
pub mod entities;
pub mod ids;
pub mod model;

// Flat re-exports for the common path (`use gx_core::{ActivityType, EmissionModel}`).
pub use categories::{
    AccommodationCategory, ActivityType, CarType, ElectricitySource, FoodFrequency,
    ProjectActivityType, RoomOccupancy,
};
pub use entities::{
    ActivityRecord, EmissionCalculation, ParticipantAnswers, ParticipantSummary, ProjectStats,
    ProjectSummary, TypeBreakdown,
};
pub use errors::CoreError;
pub use model::EmissionModel;
pub use tokens::{ParticipantId, ProjectId};

#[cfg(test)]
mod tests {
    use super::tokens::*;
    use core::str::FromStr;

    #[test]
    fn tokens_enforce_charset_and_length() {
        assert!(ProjectId::from_str("proj-2024.berlin").is_ok());
        assert!(ParticipantId::from_str("p:001").is_ok());
        assert!(ProjectId::from_str("").is_err());
        assert!(ProjectId::from_str("has space").is_err());
        assert!(ProjectId::from_str(&"x".repeat(65)).is_err());
    }
}
