//! entities.rs — value types flowing into and out of the calculators.
//!
//! All types are plain values: each calculation owns its inputs and outputs,
//! nothing here holds shared state. Wire names follow the JSON the web layer
//! already exchanges (`distanceKm`, `transportCO2`, …).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::categories::{
    AccommodationCategory, ActivityType, CarType, ElectricitySource, FoodFrequency, RoomOccupancy,
};
use crate::tokens::{ParticipantId, ProjectId};

/// One travel leg. `T` is the activity set the leg belongs to: participant legs use
/// `ActivityType`, project baseline legs use `ProjectActivityType`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ActivityRecord<T = ActivityType> {
    pub activity_type: T,
    pub distance_km: f64,
}

impl<T> ActivityRecord<T> {
    pub fn new(activity_type: T, distance_km: f64) -> Self {
        Self { activity_type, distance_km }
    }

    /// Only finite, strictly positive distances contribute to any total.
    #[inline]
    pub fn counted_distance(&self) -> Option<f64> {
        let d = self.distance_km;
        if d.is_finite() && d > 0.0 { Some(d) } else { None }
    }
}

/// Questionnaire answers as submitted (every field optional).
///
/// Distances are one-way kilometres to the project location.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ParticipantAnswers {
    pub flight_km: Option<f64>,
    pub boat_km: Option<f64>,
    pub train_km: Option<f64>,
    pub bus_km: Option<f64>,
    pub car_km: Option<f64>,
    pub car_type: Option<CarType>,
    /// People sharing the car, the driver included; may be fractional (an average).
    pub car_passengers: Option<f64>,
    /// Days on site; may be fractional (half days).
    pub days: Option<f64>,
    pub accommodation_category: Option<AccommodationCategory>,
    pub room_occupancy: Option<RoomOccupancy>,
    pub electricity: Option<ElectricitySource>,
    pub food: Option<FoodFrequency>,
}

/// Per-category breakdown for one participant, in kg CO₂.
///
/// `total_co2` is the plain sum of the four category subtotals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmissionCalculation {
    #[cfg_attr(feature = "serde", serde(rename = "transportCO2"))]
    pub transport_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "accommodationCO2"))]
    pub accommodation_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "foodCO2"))]
    pub food_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "projectActivitiesCO2"))]
    pub project_activities_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "totalCO2"))]
    pub total_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "treesNeeded"))]
    pub trees_needed: u64,
}

/// Distance, CO₂ and leg count folded for one activity type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeBreakdown {
    pub distance: f64,
    pub co2: f64,
    pub count: u64,
}

/// Project-wide aggregate over all participants' activities.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectStats {
    #[cfg_attr(feature = "serde", serde(rename = "totalParticipants"))]
    pub total_participants: u64,
    #[cfg_attr(feature = "serde", serde(rename = "totalCO2"))]
    pub total_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "averageCO2"))]
    pub average_co2: f64,
    #[cfg_attr(feature = "serde", serde(rename = "breakdownByType"))]
    pub breakdown_by_type: BTreeMap<ActivityType, TypeBreakdown>,
    #[cfg_attr(feature = "serde", serde(rename = "treesNeeded"))]
    pub trees_needed: u64,
}

/// Sortable project row (project tables).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub created_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub participant_count: u32,
    #[cfg_attr(feature = "serde", serde(default, rename = "totalCO2"))]
    pub total_co2: Option<f64>,
}

/// Sortable participant row (participant tables and leaderboards).
///
/// `total_co2` is `None` until the participant has submitted answers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub country: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub submitted_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default, rename = "totalCO2"))]
    pub total_co2: Option<f64>,
}
