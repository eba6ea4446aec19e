//! Determinism utilities: a comparator factory for project/participant lists.
//!
//! This module is **I/O-free**. It provides:
//! - `SortValue`, the typed view of one sortable field
//! - `SortFields`, implemented by row types that expose named fields
//! - `create_comparator`, a three-way ordering over one field where missing
//!   values always sort last, in either direction
//! - Field enums for projects and participants (`FromStr` for query strings)

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entities::{ParticipantSummary, ProjectSummary};
use crate::errors::CoreError;

/* -------------------------------------------------------------------------- */
/*                                 Sort values                                */
/* -------------------------------------------------------------------------- */

/// Borrowed view of one field value for ordering purposes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SortValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
    Date(DateTime<Utc>),
}

impl<'a> SortValue<'a> {
    /// NaN carries no order; it is treated like a missing value.
    #[inline]
    fn is_missing(&self) -> bool {
        match self {
            SortValue::Missing => true,
            SortValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Date(_) => 1,
            SortValue::Text(_) => 2,
            SortValue::Missing => 3,
        }
    }
}

impl From<Option<f64>> for SortValue<'_> {
    fn from(v: Option<f64>) -> Self { v.map_or(SortValue::Missing, SortValue::Number) }
}

impl From<Option<DateTime<Utc>>> for SortValue<'_> {
    fn from(v: Option<DateTime<Utc>>) -> Self { v.map_or(SortValue::Missing, SortValue::Date) }
}

impl<'a> From<Option<&'a str>> for SortValue<'a> {
    fn from(v: Option<&'a str>) -> Self { v.map_or(SortValue::Missing, SortValue::Text) }
}

/// Rows that can be ordered by a named field.
pub trait SortFields {
    type Field: Copy;
    fn sort_value(&self, field: Self::Field) -> SortValue<'_>;
}

/* -------------------------------------------------------------------------- */
/*                              Comparator factory                             */
/* -------------------------------------------------------------------------- */

/// Build a comparator over `field`.
///
/// Missing values go to the end regardless of `descending`; only the base
/// comparison between two present values is reversed.
pub fn create_comparator<T: SortFields>(
    field: T::Field,
    descending: bool,
) -> impl Fn(&T, &T) -> Ordering {
    move |a, b| {
        let (va, vb) = (a.sort_value(field), b.sort_value(field));
        match (va.is_missing(), vb.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let base = compare_present(&va, &vb);
                if descending { base.reverse() } else { base }
            }
        }
    }
}

/// Sort `rows` in place (stable) by `field`.
pub fn sort_by_field<T: SortFields>(rows: &mut [T], field: T::Field, descending: bool) {
    rows.sort_by(create_comparator(field, descending));
}

fn compare_present(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortValue::Date(x), SortValue::Date(y)) => {
            let diff = x.timestamp_millis() - y.timestamp_millis();
            diff.cmp(&0)
        }
        (SortValue::Text(x), SortValue::Text(y)) => collate(x, y),
        // Mixed kinds only appear with malformed rows; keep the order total.
        _ => a.rank().cmp(&b.rank()),
    }
}

/// Locale-style text order.
///
/// Primary key is the accent-folded, lowercased text ("Émile" files under "e"),
/// then case-insensitive text with accents kept, then raw text so distinct
/// strings never compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    fn lower(s: &str) -> impl Iterator<Item = char> + '_ { s.chars().flat_map(char::to_lowercase) }

    let primary = lower(&deunicode::deunicode(a)).cmp(lower(&deunicode::deunicode(b)));
    primary
        .then_with(|| lower(a).cmp(lower(b)))
        .then_with(|| a.cmp(b))
}

/* -------------------------------------------------------------------------- */
/*                                 Field enums                                 */
/* -------------------------------------------------------------------------- */

/// Sortable columns of the project table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ProjectField {
    Name,
    Location,
    StartDate,
    EndDate,
    CreatedAt,
    ParticipantCount,
    #[cfg_attr(feature = "serde", serde(rename = "totalCO2"))]
    TotalCo2,
}

/// Sortable columns of the participant table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ParticipantField {
    Name,
    Country,
    SubmittedAt,
    #[cfg_attr(feature = "serde", serde(rename = "totalCO2"))]
    TotalCo2,
}

impl ProjectField {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Location => "location",
            ProjectField::StartDate => "startDate",
            ProjectField::EndDate => "endDate",
            ProjectField::CreatedAt => "createdAt",
            ProjectField::ParticipantCount => "participantCount",
            ProjectField::TotalCo2 => "totalCO2",
        }
    }
}

impl ParticipantField {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantField::Name => "name",
            ParticipantField::Country => "country",
            ParticipantField::SubmittedAt => "submittedAt",
            ParticipantField::TotalCo2 => "totalCO2",
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl fmt::Display for ParticipantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ProjectField {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProjectField::Name),
            "location" => Ok(ProjectField::Location),
            "startDate" | "start_date" => Ok(ProjectField::StartDate),
            "endDate" | "end_date" => Ok(ProjectField::EndDate),
            "createdAt" | "created_at" => Ok(ProjectField::CreatedAt),
            "participantCount" | "participant_count" => Ok(ProjectField::ParticipantCount),
            "totalCO2" | "total_co2" => Ok(ProjectField::TotalCo2),
            _ => Err(CoreError::UnknownToken("project field")),
        }
    }
}

impl FromStr for ParticipantField {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ParticipantField::Name),
            "country" => Ok(ParticipantField::Country),
            "submittedAt" | "submitted_at" => Ok(ParticipantField::SubmittedAt),
            "totalCO2" | "total_co2" => Ok(ParticipantField::TotalCo2),
            _ => Err(CoreError::UnknownToken("participant field")),
        }
    }
}

impl SortFields for ProjectSummary {
    type Field = ProjectField;

    fn sort_value(&self, field: ProjectField) -> SortValue<'_> {
        match field {
            ProjectField::Name => SortValue::Text(&self.name),
            ProjectField::Location => self.location.as_deref().into(),
            ProjectField::StartDate => self.start_date.into(),
            ProjectField::EndDate => self.end_date.into(),
            ProjectField::CreatedAt => self.created_at.into(),
            ProjectField::ParticipantCount => SortValue::Number(f64::from(self.participant_count)),
            ProjectField::TotalCo2 => self.total_co2.into(),
        }
    }
}

impl SortFields for ParticipantSummary {
    type Field = ParticipantField;

    fn sort_value(&self, field: ParticipantField) -> SortValue<'_> {
        match field {
            ParticipantField::Name => SortValue::Text(&self.name),
            ParticipantField::Country => self.country.as_deref().into(),
            ParticipantField::SubmittedAt => self.submitted_at.into(),
            ParticipantField::TotalCo2 => self.total_co2.into(),
        }
    }
}
